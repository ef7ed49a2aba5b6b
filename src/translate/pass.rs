use super::Translator;
use crate::state::DoneFlag;
use crate::storage::{
    read_text, save_and_copy, CellRef, CellValue, Column, RunKind, RunStatus, SheetId, Snapshots,
    TabularStore, SENTINEL,
};
use crate::Result;
use std::time::Instant;

/// Counters of a translation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TranslateReport {
    pub run_id: i64,
    /// Rows translated in this pass
    pub translated: u64,
    /// Rows already marked translated
    pub skipped: u64,
    /// Cells copied through without a request
    pub passed_through: u64,
}

/// Translates every sheet of the workbook
///
/// Rows whose `translated` column is `YES` are left alone, so an
/// interrupted pass resumes where it stopped.
pub async fn translate_workbook<S, T>(
    store: &mut S,
    snapshots: &Snapshots,
    translator: &T,
    config_hash: &str,
) -> Result<TranslateReport>
where
    S: TabularStore,
    T: Translator,
{
    snapshots.take_backup()?;
    let run_id = store.begin_run(RunKind::Translate, None, config_hash)?;
    save_and_copy(store, snapshots)?;

    let mut report = TranslateReport {
        run_id,
        ..TranslateReport::default()
    };
    let result = translate_sheets(store, snapshots, translator, &mut report).await;

    let status = if result.is_ok() {
        RunStatus::Completed
    } else {
        RunStatus::Failed
    };
    let errors = u32::from(result.is_err());
    store.finish_run(run_id, status, errors)?;
    save_and_copy(store, snapshots)?;

    result.map(|_| report)
}

async fn translate_sheets<S, T>(
    store: &mut S,
    snapshots: &Snapshots,
    translator: &T,
    report: &mut TranslateReport,
) -> Result<()>
where
    S: TabularStore,
    T: Translator,
{
    let sheets = store.partitions()?;
    if let (Some((_, first)), Some((_, last))) = (sheets.first(), sheets.last()) {
        tracing::info!("Translating sheets from {} to {}", first, last);
    }

    for (sheet, name) in sheets {
        tracing::info!("Sheet {}", name);

        for column in Column::TRANSLATION {
            store.write_cell(
                sheet,
                CellRef::new(column, 1),
                Some(CellValue::text(column.header())),
            )?;
        }

        let max_row = store.max_row(sheet)?;
        for row in 2..=max_row {
            translate_row(store, sheet, row, translator, report).await?;
            save_and_copy(store, snapshots)?;
        }

        save_and_copy(store, snapshots)?;
    }

    Ok(())
}

async fn translate_row<S, T>(
    store: &mut S,
    sheet: SheetId,
    row: u32,
    translator: &T,
    report: &mut TranslateReport,
) -> Result<()>
where
    S: TabularStore,
    T: Translator,
{
    let started = Instant::now();
    tracing::debug!("Row {}", row);

    let flag = read_text(&*store, sheet, CellRef::new(Column::Translated, row))?;
    if DoneFlag::from_cell(flag.as_deref()).is_done() {
        report.skipped += 1;
        tracing::debug!("Row {} already translated", row);
        return Ok(());
    }

    let text = read_text(&*store, sheet, CellRef::new(Column::Text, row))?;
    let company = read_text(&*store, sheet, CellRef::new(Column::Company, row))?;

    let text = translate_cell(translator, text, report).await?;
    let company = translate_cell(translator, company, report).await?;

    let translated = DoneFlag::Yes.as_cell().map(CellValue::text);
    store.write_cell(sheet, CellRef::new(Column::Translated, row), translated)?;
    store.write_cell(
        sheet,
        CellRef::new(Column::TextTranslated, row),
        text.map(CellValue::Text),
    )?;
    store.write_cell(
        sheet,
        CellRef::new(Column::CompanyTranslated, row),
        company.map(CellValue::Text),
    )?;

    report.translated += 1;
    tracing::info!(
        "Row {} translated in {:.2}s",
        row,
        started.elapsed().as_secs_f64()
    );
    Ok(())
}

/// Translates one cell; empty and sentinel cells are copied through
async fn translate_cell<T: Translator>(
    translator: &T,
    value: Option<String>,
    report: &mut TranslateReport,
) -> Result<Option<String>> {
    match value {
        Some(text) if !is_passthrough(&text) => Ok(Some(translator.translate(&text).await?)),
        other => {
            report.passed_through += 1;
            Ok(other)
        }
    }
}

fn is_passthrough(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.is_empty() || trimmed == SENTINEL
}
