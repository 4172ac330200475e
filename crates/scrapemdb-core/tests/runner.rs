mod common;

use common::{config, core_page, schema, FakeNavigator};
use scrapemdb_core::layout::{data_dir, main_document, LIST_INFO_KEY};
use scrapemdb_core::{
    DocumentStore, EntityHarvester, ListMode, MediaType, OutputLayout, RunOptions, RunSummary,
    Runner, ScrapeError,
};

const HEAT: &str = "https://www.example.com/title/tt1/";
const RONIN: &str = "https://www.example.com/title/tt2/";
const GONE: &str = "https://www.example.com/title/tt3/";

fn runner(root: &std::path::Path) -> Runner<FakeNavigator> {
    let nav = FakeNavigator::new()
        .page(HEAT, core_page("Heat", "1995", "Movie"))
        .page(RONIN, core_page("Ronin", "1998", "Movie"));
    Runner::new(EntityHarvester::new(
        nav,
        schema(),
        config(),
        OutputLayout::new(root),
    ))
}

fn options(targets: &[&str]) -> RunOptions {
    RunOptions {
        targets: targets.iter().map(|t| t.to_string()).collect(),
        fast: true,
        ..RunOptions::default()
    }
}

#[tokio::test]
async fn test_single_target_goes_to_category_root() {
    let dir = tempfile::tempdir().unwrap();
    let mut runner = runner(dir.path());

    let summary = runner.run(&options(&[HEAT])).await.unwrap();

    assert_eq!(
        summary,
        RunSummary {
            harvested: 1,
            failed: 0,
            skipped: 0
        }
    );
    assert!(main_document(&data_dir(&dir.path().join("Movies").join("Heat (1995)"))).exists());
    assert!(!dir.path().join("Lists").exists());
}

#[tokio::test]
async fn test_multiple_targets_form_a_batch_list() {
    let dir = tempfile::tempdir().unwrap();
    let mut runner = runner(dir.path());

    let summary = runner.run(&options(&[HEAT, GONE, RONIN])).await.unwrap();

    assert_eq!(summary.harvested, 2);
    assert_eq!(summary.failed, 1);

    let lists: Vec<_> = std::fs::read_dir(dir.path().join("Lists"))
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    assert_eq!(lists.len(), 1);
    let doc = DocumentStore::new()
        .read(&main_document(&data_dir(&lists[0])))
        .unwrap();
    assert!(doc[LIST_INFO_KEY]["ListName"]
        .as_str()
        .unwrap()
        .starts_with("Batch_"));
    assert_eq!(doc["Heat"]["Title"], "Heat");
    assert_eq!(doc["Ronin"]["Title"], "Ronin");
}

#[tokio::test]
async fn test_series_skipped_in_list_mode() {
    let dir = tempfile::tempdir().unwrap();
    let mut runner = runner(dir.path());
    let options = RunOptions {
        media_type: Some(MediaType::Series),
        list: ListMode::New("Noir".to_string()),
        ..options(&[HEAT, RONIN])
    };

    let summary = runner.run(&options).await.unwrap();

    assert_eq!(summary.skipped, 2);
    assert_eq!(summary.harvested, 0);
    assert!(runner.harvester().navigator().history.is_empty());
}

#[tokio::test]
async fn test_append_rejects_entity_folder() {
    let dir = tempfile::tempdir().unwrap();
    let mut runner = runner(dir.path());
    let movie = dir.path().join("Movies").join("Heat (1995)");
    std::fs::create_dir_all(data_dir(&movie)).unwrap();
    let options = RunOptions {
        list: ListMode::Append(movie),
        ..options(&[RONIN])
    };

    let result = runner.run(&options).await;

    assert!(matches!(result, Err(ScrapeError::InvalidListFolder(_))));
}
