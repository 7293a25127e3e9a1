use super::*;
use tokio::{sync::Notify, time::advance};

use crate::fake_api::{record, settle, FakeApi};

fn rendered_names(view: &ViewState) -> Vec<String> {
    match view.snapshot().list {
        ListContent::Records(records) => records.into_iter().map(|r| r.user_name).collect(),
        other => panic!("expected records, got {other:?}"),
    }
}

fn poller(api: &Arc<FakeApi>) -> (Arc<ListPoller>, ViewState) {
    let view = ViewState::new();
    let poller = ListPoller::new(api.clone(), view.clone());
    (Arc::new(poller), view)
}

#[tokio::test]
async fn refresh_renders_records_in_service_order() {
    let api = Arc::new(FakeApi::new());
    api.push_list(Ok(vec![record("Newest", 30), record("Oldest", 70)]));
    let (poller, view) = poller(&api);

    assert_eq!(poller.refresh().await, Ok(2));

    let ListContent::Records(records) = view.snapshot().list else {
        panic!("expected records");
    };
    let names: Vec<_> = records.iter().map(|r| r.user_name.as_str()).collect();
    assert_eq!(names, ["Newest", "Oldest"]);
}

#[tokio::test]
async fn refresh_with_no_records_shows_empty_placeholder() {
    let api = Arc::new(FakeApi::new());
    let (poller, view) = poller(&api);
    assert_eq!(view.snapshot().list, ListContent::Loading);

    assert_eq!(poller.refresh().await, Ok(0));
    assert_eq!(view.snapshot().list, ListContent::Empty);
}

#[tokio::test]
async fn failed_refresh_replaces_previous_records_with_error_placeholder() {
    let api = Arc::new(FakeApi::new());
    api.push_list(Ok(vec![record("Ada", 36)]));
    api.push_list(Err(ApiCallError::Transport("connection reset".to_string())));
    let (poller, view) = poller(&api);

    poller.refresh().await.expect("first refresh");
    let err = poller.refresh().await.expect_err("second refresh fails");

    assert_eq!(err, ApiCallError::Transport("connection reset".to_string()));
    assert_eq!(view.snapshot().list, ListContent::Failed);
}

#[tokio::test]
async fn overlapping_refreshes_render_whichever_finishes_last() {
    let gate = Arc::new(Notify::new());
    let api = Arc::new(FakeApi::new().with_list_gate(gate.clone()));
    api.push_list(Ok(vec![record("Slow", 1)]));
    api.push_list(Ok(vec![record("Fast", 2)]));
    let (poller, view) = poller(&api);

    let slow = tokio::spawn({
        let poller = Arc::clone(&poller);
        async move { poller.refresh().await }
    });
    while api.list_calls() == 0 {
        settle().await;
    }

    poller.refresh().await.expect("fast refresh");
    assert_eq!(rendered_names(&view), ["Fast"]);

    gate.notify_one();
    slow.await.expect("join").expect("slow refresh");
    assert_eq!(rendered_names(&view), ["Slow"]);
}

#[tokio::test]
async fn late_failure_replaces_an_earlier_finished_list() {
    let gate = Arc::new(Notify::new());
    let api = Arc::new(FakeApi::new().with_list_gate(gate.clone()));
    api.push_list(Err(ApiCallError::Transport("timed out".to_string())));
    api.push_list(Ok(vec![record("Fast", 2)]));
    let (poller, view) = poller(&api);

    let slow = tokio::spawn({
        let poller = Arc::clone(&poller);
        async move { poller.refresh().await }
    });
    while api.list_calls() == 0 {
        settle().await;
    }
    poller.refresh().await.expect("fast refresh");

    gate.notify_one();
    assert!(slow.await.expect("join").is_err());
    assert_eq!(view.snapshot().list, ListContent::Failed);
}

#[tokio::test(start_paused = true)]
async fn polls_immediately_then_on_every_interval() {
    let api = Arc::new(FakeApi::new());
    let (poller, _view) = poller(&api);

    let handle = poller.spawn(Duration::from_secs(3));
    settle().await;
    assert_eq!(api.list_calls(), 1);
    assert!(handle.is_running());

    advance(Duration::from_millis(2_999)).await;
    settle().await;
    assert_eq!(api.list_calls(), 1);

    advance(Duration::from_millis(1)).await;
    settle().await;
    assert_eq!(api.list_calls(), 2);

    advance(Duration::from_secs(3)).await;
    settle().await;
    assert_eq!(api.list_calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn failure_is_shown_until_next_successful_tick() {
    let api = Arc::new(FakeApi::new());
    api.push_list(Err(ApiCallError::Rejected {
        status: 500,
        message: "Internal server error".to_string(),
    }));
    api.push_list(Ok(vec![record("Ada", 36)]));
    let (poller, view) = poller(&api);

    let _handle = poller.spawn(Duration::from_secs(3));
    settle().await;
    assert_eq!(view.snapshot().list, ListContent::Failed);

    advance(Duration::from_secs(3)).await;
    settle().await;
    assert!(matches!(view.snapshot().list, ListContent::Records(_)));
}

#[tokio::test(start_paused = true)]
async fn transport_failure_does_not_stop_the_ticker() {
    let api = Arc::new(FakeApi::new());
    api.push_list(Err(ApiCallError::Transport("connection refused".to_string())));
    api.push_list(Err(ApiCallError::Transport("connection refused".to_string())));
    api.push_list(Ok(vec![record("Back", 5)]));
    let (poller, view) = poller(&api);

    let handle = poller.spawn(Duration::from_secs(3));
    settle().await;
    assert_eq!(view.snapshot().list, ListContent::Failed);

    advance(Duration::from_secs(3)).await;
    settle().await;
    assert_eq!(api.list_calls(), 2);
    assert_eq!(view.snapshot().list, ListContent::Failed);
    assert!(handle.is_running());

    advance(Duration::from_secs(3)).await;
    settle().await;
    assert_eq!(api.list_calls(), 3);
    assert_eq!(rendered_names(&view), ["Back"]);
}

#[tokio::test(start_paused = true)]
async fn stopping_the_handle_halts_polling() {
    let api = Arc::new(FakeApi::new());
    let (poller, _view) = poller(&api);

    let handle = poller.spawn(Duration::from_secs(3));
    settle().await;
    handle.stop();
    settle().await;

    advance(Duration::from_secs(30)).await;
    settle().await;
    assert_eq!(api.list_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn dropping_the_handle_halts_polling() {
    let api = Arc::new(FakeApi::new());
    let (poller, _view) = poller(&api);

    drop(poller.spawn(Duration::from_secs(3)));
    settle().await;

    advance(Duration::from_secs(30)).await;
    settle().await;
    assert!(api.list_calls() <= 1);
}
