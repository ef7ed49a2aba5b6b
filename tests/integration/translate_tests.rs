//! Translation pass tests against a mock translation API

use crate::common::TempWorkbook;
use exhibitor_harvest::config::TranslateConfig;
use exhibitor_harvest::storage::{
    ensure_partition, read_text, write_outcome, CellRef, CellValue, Column, RecordOutcome,
    RunKind, RunStatus, SheetId, SqliteWorkbook, TabularStore, SENTINEL,
};
use exhibitor_harvest::translate::{
    build_http_client, translate_workbook, GoogleTranslator, TranslateError, TranslateResult,
    Translator,
};
use exhibitor_harvest::HarvestError;
use serde_json::json;
use std::cell::Cell;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn translation(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "data": { "translations": [ { "translatedText": text } ] }
    }))
}

fn translator_for(server: &MockServer) -> GoogleTranslator {
    let config = TranslateConfig {
        api_url: format!("{}/language/translate/v2", server.uri()),
        ..TranslateConfig::default()
    };
    GoogleTranslator::new(build_http_client().unwrap(), &config, "test-key").unwrap()
}

/// Sheet 0 with a translatable row, a sentinel row and an already translated row
fn scraped_workbook(book: &TempWorkbook) -> (SqliteWorkbook, SheetId) {
    let mut workbook = book.open();
    let sheet = ensure_partition(&mut workbook, 0).unwrap();

    let mut row2 = RecordOutcome::pending(1, 1);
    row2.text = "TEXT\n你好".to_string();
    row2.company = "深圳公司".to_string();
    row2.mark_succeeded();
    write_outcome(&mut workbook, sheet, 2, &row2).unwrap();

    let mut row3 = RecordOutcome::pending(1, 2);
    row3.mark_failed("Company detail not found");
    write_outcome(&mut workbook, sheet, 3, &row3).unwrap();

    let mut row4 = RecordOutcome::pending(1, 3);
    row4.text = "TEXT\n再见".to_string();
    row4.mark_succeeded();
    write_outcome(&mut workbook, sheet, 4, &row4).unwrap();
    workbook
        .write_cell(
            sheet,
            CellRef::new(Column::Translated, 4),
            Some(CellValue::text("YES")),
        )
        .unwrap();
    workbook
        .write_cell(
            sheet,
            CellRef::new(Column::TextTranslated, 4),
            Some(CellValue::text("TEXTO\nAdiós")),
        )
        .unwrap();

    workbook.save().unwrap();
    (workbook, sheet)
}

fn cell(store: &SqliteWorkbook, sheet: SheetId, column: Column, row: u32) -> Option<String> {
    read_text(store, sheet, CellRef::new(column, row)).unwrap()
}

#[tokio::test]
async fn test_translate_workbook_fills_translation_columns() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/language/translate/v2"))
        .and(query_param("key", "test-key"))
        .and(body_partial_json(json!({
            "q": "深圳公司",
            "source": "zh-CN",
            "target": "es",
            "format": "text"
        })))
        .respond_with(translation("Empresa de Shenzhen"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/language/translate/v2"))
        .and(body_partial_json(json!({ "q": "TEXT\n你好" })))
        .respond_with(translation("TEXTO\nHola"))
        .expect(1)
        .mount(&server)
        .await;

    let book = TempWorkbook::new();
    let (mut workbook, sheet) = scraped_workbook(&book);
    let snapshots = book.snapshots();

    let report = translate_workbook(&mut workbook, &snapshots, &translator_for(&server), "hash")
        .await
        .unwrap();

    assert_eq!(report.translated, 2);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.passed_through, 2);

    assert_eq!(cell(&workbook, sheet, Column::Translated, 1).as_deref(), Some("translated"));
    assert_eq!(cell(&workbook, sheet, Column::Translated, 2).as_deref(), Some("YES"));
    assert_eq!(
        cell(&workbook, sheet, Column::TextTranslated, 2).as_deref(),
        Some("TEXTO\nHola")
    );
    assert_eq!(
        cell(&workbook, sheet, Column::CompanyTranslated, 2).as_deref(),
        Some("Empresa de Shenzhen")
    );

    // Sentinel cells are copied through
    assert_eq!(cell(&workbook, sheet, Column::Translated, 3).as_deref(), Some("YES"));
    assert_eq!(
        cell(&workbook, sheet, Column::CompanyTranslated, 3).as_deref(),
        Some(SENTINEL)
    );

    // Already translated rows are untouched
    assert_eq!(
        cell(&workbook, sheet, Column::TextTranslated, 4).as_deref(),
        Some("TEXTO\nAdiós")
    );

    let run = workbook.latest_run().unwrap().unwrap();
    assert_eq!(run.kind, RunKind::Translate);
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.start_page, None);

    assert_eq!(
        std::fs::read(snapshots.copy()).unwrap(),
        std::fs::read(snapshots.primary()).unwrap()
    );
}

#[tokio::test]
async fn test_api_error_fails_the_pass() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/language/translate/v2"))
        .respond_with(ResponseTemplate::new(403).set_body_string("API key not valid"))
        .mount(&server)
        .await;

    let book = TempWorkbook::new();
    let (mut workbook, sheet) = scraped_workbook(&book);
    let snapshots = book.snapshots();

    let err = translate_workbook(&mut workbook, &snapshots, &translator_for(&server), "hash")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        HarvestError::Translate(TranslateError::Status { status: 403, .. })
    ));
    assert_eq!(cell(&workbook, sheet, Column::Translated, 2), None);

    let run = workbook.latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Failed);
    assert_eq!(run.errors, 1);
}

/// Translator that upper-cases its input and counts requests
#[derive(Default)]
struct CountingTranslator {
    calls: Cell<u32>,
}

impl Translator for CountingTranslator {
    async fn translate(&self, text: &str) -> TranslateResult<String> {
        self.calls.set(self.calls.get() + 1);
        Ok(text.to_uppercase())
    }
}

#[tokio::test]
async fn test_second_pass_makes_no_requests() {
    let book = TempWorkbook::new();
    let (mut workbook, sheet) = scraped_workbook(&book);
    let snapshots = book.snapshots();
    let translator = CountingTranslator::default();

    translate_workbook(&mut workbook, &snapshots, &translator, "hash")
        .await
        .unwrap();
    assert_eq!(translator.calls.get(), 2);
    assert_eq!(
        cell(&workbook, sheet, Column::TextTranslated, 2).as_deref(),
        Some("TEXT\n你好")
    );

    let report = translate_workbook(&mut workbook, &snapshots, &translator, "hash")
        .await
        .unwrap();
    assert_eq!(translator.calls.get(), 2);
    assert_eq!(report.translated, 0);
    assert_eq!(report.skipped, 3);
}
