//! Run driver tests: page loop, resume, circuit breaker and rollover

use crate::common::{detail_page, detail_url, test_settings, FakeBrowser, TempWorkbook};
use exhibitor_harvest::harvest::{go_to_page, PageTarget};
use exhibitor_harvest::state::{DoneFlag, ErrorBudget};
use exhibitor_harvest::storage::{
    read_done, read_text, CellRef, Column, RunStatus, SqliteWorkbook, TabularStore,
};
use exhibitor_harvest::{HarvestError, Harvester, RunOutcome};

fn build_harvester(
    browser: FakeBrowser,
    book: &TempWorkbook,
) -> Harvester<FakeBrowser, SqliteWorkbook> {
    Harvester::new(browser, book.open(), book.snapshots(), test_settings(), "hash")
}

/// Two full listing pages of two cards each, every detail page available
fn two_page_site() -> FakeBrowser {
    FakeBrowser::new(2)
        .with_listing(1, &["exhibitor/1", "exhibitor/2"])
        .with_listing(2, &["exhibitor/3", "exhibitor/4"])
        .with_detail("exhibitor/1", detail_page("Alpha", Some("Hall 1")))
        .with_detail("exhibitor/2", detail_page("Beta", Some("Hall 2")))
        .with_detail("exhibitor/3", detail_page("Gamma", Some("Hall 3")))
        .with_detail("exhibitor/4", detail_page("Delta", None))
}

#[tokio::test]
async fn test_run_completes_all_pages() {
    let book = TempWorkbook::new();
    let mut harvester = Harvester::new(
        two_page_site(),
        book.open(),
        book.snapshots(),
        test_settings(),
        "hash",
    );

    let report = harvester.run(1, 2).await.unwrap();

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(report.first_page, 1);
    assert_eq!(report.tally.extracted, 4);
    assert_eq!(report.failures, 0);
    assert_eq!(report.cursor.page, 2);
    assert_eq!(harvester.browser().pager_clicks, 2);
    assert_eq!(harvester.browser().open_detail_tabs(), 0);
    assert_eq!(
        harvester.browser().navigations,
        vec!["https://expo.test/exhibitorlist?type=1".to_string()]
    );

    let store = harvester.store();
    let sheet = store.partition("0").unwrap();

    // Page 1 records land in rows 2-3, page 2 starts at record 13 (row 14)
    assert_eq!(read_done(store, sheet, 2).unwrap(), DoneFlag::Yes);
    assert_eq!(read_done(store, sheet, 3).unwrap(), DoneFlag::Yes);
    assert_eq!(read_done(store, sheet, 14).unwrap(), DoneFlag::Yes);
    assert_eq!(read_done(store, sheet, 15).unwrap(), DoneFlag::Yes);
    assert_eq!(
        read_text(store, sheet, CellRef::new(Column::Company, 14))
            .unwrap()
            .as_deref(),
        Some("Gamma")
    );
    assert_eq!(
        read_text(store, sheet, CellRef::new(Column::Number, 15))
            .unwrap()
            .as_deref(),
        Some("14")
    );

    let run = store.latest_run().unwrap().unwrap();
    assert_eq!(run.id, report.run_id);
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.start_page, Some(1));
    assert_eq!(run.end_page, Some(2));
    assert_eq!(run.config_hash, "hash");
    assert!(run.finished_at.is_some());
}

#[tokio::test]
async fn test_resumed_run_skips_done_records() {
    let book = TempWorkbook::new();

    let mut first = build_harvester(two_page_site(), &book);
    first.run(1, 2).await.unwrap();
    first.shutdown().await.unwrap();

    let mut second = build_harvester(two_page_site(), &book);
    let report = second.run(1, 2).await.unwrap();

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(report.tally.skipped, 4);
    assert_eq!(report.tally.extracted, 0);
    assert!(second.browser().opened.is_empty());

    // The backup taken at the start of the second run holds the first run's rows
    let backup = SqliteWorkbook::open(book.snapshots().backup()).unwrap();
    let sheet = backup.partition("0").unwrap();
    assert_eq!(read_done(&backup, sheet, 2).unwrap(), DoneFlag::Yes);
}

#[tokio::test]
async fn test_budget_one_short_stops_after_next_failure() {
    let book = TempWorkbook::new();
    let mut settings = test_settings();
    settings.max_attempts = 1;

    // Page 1's only card has no detail page
    let browser = FakeBrowser::new(2)
        .with_listing(1, &["exhibitor/broken"])
        .with_listing(2, &["exhibitor/2"])
        .with_detail("exhibitor/2", detail_page("Beta", None));
    let mut harvester = Harvester::new(browser, book.open(), book.snapshots(), settings, "hash");

    let report = harvester
        .run_with_budget(1, 2, ErrorBudget::with_failures(5, 4))
        .await
        .unwrap();

    assert_eq!(report.outcome, RunOutcome::StoppedDueToErrors);
    assert_eq!(report.failures, 5);
    // Only the jump to the start page; the breaker tripped before page 2
    assert_eq!(harvester.browser().pager_clicks, 1);
    assert_eq!(harvester.browser().current_page, 1);
    assert_eq!(harvester.browser().opened.len(), 1);

    let run = harvester.store().latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::StoppedDueToErrors);
    assert_eq!(run.errors, 5);
}

#[tokio::test]
async fn test_exhausted_budget_does_not_process_pages() {
    let book = TempWorkbook::new();
    let mut harvester = build_harvester(two_page_site(), &book);

    let report = harvester
        .run_with_budget(1, 2, ErrorBudget::with_failures(5, 5))
        .await
        .unwrap();

    assert_eq!(report.outcome, RunOutcome::StoppedDueToErrors);
    assert!(harvester.browser().opened.is_empty());
    assert_eq!(report.tally.extracted, 0);
}

#[tokio::test]
async fn test_empty_page_does_not_stop_the_run() {
    let book = TempWorkbook::new();
    let browser = FakeBrowser::new(2)
        .with_listing(2, &["exhibitor/13"])
        .with_detail("exhibitor/13", detail_page("Mu", Some("Hall 9")));
    let mut harvester = build_harvester(browser, &book);

    let report = harvester.run(1, 2).await.unwrap();

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(report.tally.empty_pages, 1);
    assert_eq!(report.tally.extracted, 1);
    assert_eq!(report.failures, 0);

    let store = harvester.store();
    let sheet = store.partition("0").unwrap();
    assert_eq!(read_done(store, sheet, 2).unwrap(), DoneFlag::Unset);
    assert_eq!(read_done(store, sheet, 14).unwrap(), DoneFlag::Yes);
}

#[tokio::test]
async fn test_navigation_exhaustion_is_fatal() {
    let book = TempWorkbook::new();
    let mut browser = two_page_site();
    browser.pager_failures = u32::MAX;
    let mut harvester = build_harvester(browser, &book);

    let err = harvester.run(1, 2).await.unwrap_err();

    assert!(matches!(
        err,
        HarvestError::NavigationExhausted {
            page: 1,
            attempts: 3
        }
    ));
    assert_eq!(
        err.to_string(),
        "It was not possible to go to the page 1 after 3 attempts"
    );

    let run = harvester.store().latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Failed);
}

#[tokio::test]
async fn test_navigation_recovers_within_retries() {
    let book = TempWorkbook::new();
    let mut browser = two_page_site();
    browser.pager_failures = 2;
    let mut harvester = build_harvester(browser, &book);

    let report = harvester.run(1, 2).await.unwrap();

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(report.tally.extracted, 4);
}

#[tokio::test]
async fn test_rollover_opens_new_sheet() {
    let book = TempWorkbook::new();
    let browser = FakeBrowser::new(100)
        .with_listing(99, &["exhibitor/1177"])
        .with_listing(100, &["exhibitor/1189", "exhibitor/1190"])
        .with_detail("exhibitor/1177", detail_page("Last", None))
        .with_detail("exhibitor/1189", detail_page("First", None))
        .with_detail("exhibitor/1190", detail_page("Second", None));
    let mut harvester = build_harvester(browser, &book);

    let report = harvester.run(99, 100).await.unwrap();

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(report.cursor.partition_id, 1);

    let store = harvester.store();
    let names: Vec<String> = store
        .partitions()
        .unwrap()
        .into_iter()
        .map(|(_, name)| name)
        .collect();
    assert_eq!(names, vec!["0".to_string(), "1".to_string()]);

    let first = store.partition("0").unwrap();
    assert_eq!(read_done(store, first, 1178).unwrap(), DoneFlag::Yes);

    let second = store.partition("1").unwrap();
    assert_eq!(
        read_text(store, second, CellRef::new(Column::Done, 1))
            .unwrap()
            .as_deref(),
        Some("done")
    );
    assert_eq!(
        read_text(store, second, CellRef::new(Column::Company, 2))
            .unwrap()
            .as_deref(),
        Some("First")
    );
    assert_eq!(
        read_text(store, second, CellRef::new(Column::Number, 3))
            .unwrap()
            .as_deref(),
        Some("1190")
    );
}

#[tokio::test]
async fn test_invalid_range_is_rejected() {
    let book = TempWorkbook::new();
    let mut harvester = build_harvester(two_page_site(), &book);

    let err = harvester.run(5, 2).await.unwrap_err();
    assert!(matches!(err, HarvestError::InvalidRange { start: 5, end: 2 }));
    assert!(harvester.browser().navigations.is_empty());
}

/// Adds a listing page with `count` cards named `<prefix>/<i>`, all with detail pages
fn with_cards(mut browser: FakeBrowser, page: u32, prefix: &str, count: usize) -> FakeBrowser {
    let hrefs: Vec<String> = (0..count).map(|i| format!("{}/{}", prefix, i)).collect();
    let refs: Vec<&str> = hrefs.iter().map(String::as_str).collect();
    browser = browser.with_listing(page, &refs);
    for (i, href) in hrefs.iter().enumerate() {
        browser = browser.with_detail(href, detail_page(&format!("{}{}", prefix, i), None));
    }
    browser
}

#[tokio::test]
async fn test_overfull_page_keeps_next_page_records() {
    let book = TempWorkbook::new();
    let browser = with_cards(with_cards(FakeBrowser::new(2), 1, "a", 13), 2, "b", 2);
    let mut harvester = build_harvester(browser, &book);

    let report = harvester.run(1, 2).await.unwrap();

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(report.tally.extracted, 14);
    assert_eq!(report.tally.skipped, 0);
    assert_eq!(report.tally.overflow_cards, 1);

    let opened = &harvester.browser().opened;
    assert!(!opened.contains(&detail_url("a/12")));
    assert!(opened.contains(&detail_url("b/0")));
    assert!(opened.contains(&detail_url("b/1")));

    let store = harvester.store();
    let sheet = store.partition("0").unwrap();
    assert_eq!(
        read_text(store, sheet, CellRef::new(Column::Company, 13))
            .unwrap()
            .as_deref(),
        Some("a11")
    );
    assert_eq!(
        read_text(store, sheet, CellRef::new(Column::Company, 14))
            .unwrap()
            .as_deref(),
        Some("b0")
    );
    assert_eq!(
        read_text(store, sheet, CellRef::new(Column::Number, 14))
            .unwrap()
            .as_deref(),
        Some("13")
    );
}

#[tokio::test]
async fn test_overfull_page_before_rollover_stays_in_its_sheet() {
    let book = TempWorkbook::new();
    let browser = with_cards(with_cards(FakeBrowser::new(100), 99, "a", 13), 100, "b", 1);
    let mut harvester = build_harvester(browser, &book);

    let report = harvester.run(99, 100).await.unwrap();

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(report.tally.extracted, 13);
    assert_eq!(report.tally.overflow_cards, 1);

    let store = harvester.store();
    let first = store.partition("0").unwrap();
    assert_eq!(store.max_row(first).unwrap(), 1189);
    let second = store.partition("1").unwrap();
    assert_eq!(
        read_text(store, second, CellRef::new(Column::Company, 2))
            .unwrap()
            .as_deref(),
        Some("b0")
    );
}

#[tokio::test]
async fn test_exact_jump_reports_the_page_shown() {
    let settings = test_settings();
    let mut browser = FakeBrowser::new(3);

    let landed = go_to_page(&mut browser, &settings, PageTarget::Exact(2))
        .await
        .unwrap();
    assert_eq!(landed, 2);
    assert_eq!(browser.current_page, 2);

    // The listing only has three pages and clamps the jump
    let landed = go_to_page(&mut browser, &settings, PageTarget::Exact(5))
        .await
        .unwrap();
    assert_eq!(landed, 3);
    assert_eq!(browser.current_page, 3);
}
