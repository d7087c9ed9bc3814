use chrono::{TimeZone, Utc};
use eisenhower_rs_config::EisenhowerConfig;
use eisenhower_rs_core::{
    Clock, Dispatcher, MenuItem, MenuOutcome, RetryPolicy, RetryingTransport, Sweeper, Transport,
    TransportError,
};
use eisenhower_rs_protocol::{
    Category, ItemKind, Notice, Preset, PriorityRecord, Request, Response, Settings,
};
use eisenhower_rs_store::{MemoryStore, PriorityStore};
use eisenhower_rs_test_utils::{FixedClock, FlakyTransport, JIRA_URL, OWA_URL};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

fn opened() -> Response {
    Response::Opened {
        id: "AAQkADA1".to_string(),
    }
}

#[tokio::test(start_paused = true)]
async fn retries_not_ready_with_fixed_backoff() {
    let flaky = Arc::new(FlakyTransport::new(2, opened()));
    let transport = RetryingTransport::new(flaky.clone(), RetryPolicy::default());
    assert_eq!(
        transport.send(Request::GetPriorities {}).await,
        Ok(opened())
    );
    let times = flaky.attempt_times();
    assert_eq!(times.len(), 3);
    assert_eq!(times[1] - times[0], Duration::from_millis(300));
    assert_eq!(times[2] - times[1], Duration::from_millis(300));
}

#[tokio::test(start_paused = true)]
async fn gives_up_after_two_retries() {
    let flaky = Arc::new(FlakyTransport::unreachable());
    let transport = RetryingTransport::new(flaky.clone(), RetryPolicy::default());
    assert!(matches!(
        transport.send(Request::ExportData {}).await,
        Err(TransportError::NotReady(_))
    ));
    assert_eq!(flaky.attempt_times().len(), 3);

    let dispatcher = Dispatcher::new(
        &EisenhowerConfig::default(),
        Arc::new(MemoryStore::new()),
        Arc::new(RetryingTransport::new(flaky, RetryPolicy::default())),
    )
    .expect("dispatcher");
    let MenuOutcome::Reply(reply) = dispatcher
        .on_menu_click(MenuItem::Preset(Preset::Delegate), OWA_URL)
        .await
    else {
        panic!("expected a reply");
    };
    assert!(!reply.is_success());
    assert_eq!(
        reply.notice(),
        Some(&Notice::error(
            "❌ The page did not respond, reload it and try again"
        ))
    );
}

#[tokio::test]
async fn menu_clicks_route_by_host() {
    let store = Arc::new(MemoryStore::new());
    let flaky = Arc::new(FlakyTransport::new(0, opened()));
    let dispatcher = Dispatcher::new(&EisenhowerConfig::default(), store.clone(), flaky.clone())
        .expect("dispatcher");

    dispatcher
        .on_menu_click(MenuItem::Preset(Preset::Schedule), OWA_URL)
        .await;
    dispatcher
        .on_menu_click(MenuItem::Preset(Preset::Schedule), JIRA_URL)
        .await;
    store
        .save_settings(&Settings {
            custom_exchange_urls: vec!["https://jira.example.com".to_string()],
            ..Settings::default()
        })
        .await
        .expect("settings");
    dispatcher
        .on_menu_click(MenuItem::Preset(Preset::Eliminate), JIRA_URL)
        .await;

    assert_eq!(
        flaky.requests(),
        vec![
            Request::CategorizeFromContextMenu {
                importance: 4,
                urgency: 2
            },
            Request::CategorizeWebPage {
                importance: 4,
                urgency: 2
            },
            Request::CategorizeFromContextMenu {
                importance: 2,
                urgency: 2
            },
        ]
    );
}

#[tokio::test]
async fn picker_input_is_validated_before_sending() {
    let flaky = Arc::new(FlakyTransport::new(0, opened()));
    let dispatcher = Dispatcher::new(
        &EisenhowerConfig::default(),
        Arc::new(MemoryStore::new()),
        flaky.clone(),
    )
    .expect("dispatcher");
    let rejected = dispatcher.save_from_picker(Some(3), None).await;
    assert!(matches!(rejected, Response::Failed { .. }));
    assert!(flaky.requests().is_empty());

    assert_eq!(dispatcher.save_from_picker(Some(3), Some(4)).await, opened());
    assert_eq!(
        flaky.requests(),
        vec![Request::SavePriority {
            importance: 3,
            urgency: 4
        }]
    );
}

#[tokio::test]
async fn store_requests_are_answered_locally() {
    let store = Arc::new(MemoryStore::new());
    let now = Utc.with_ymd_and_hms(2025, 5, 2, 8, 0, 0).single().expect("now");
    store
        .upsert(
            ItemKind::Email,
            PriorityRecord::new("AAQkADA1", "RE: Weekly sync", 4, 4, now),
        )
        .await
        .expect("upsert");
    store
        .upsert(
            ItemKind::WebPage,
            PriorityRecord::new(JIRA_URL, "Broken build on main", 2, 4, now)
                .with_hostname("jira.example.com"),
        )
        .await
        .expect("upsert");
    let flaky = Arc::new(FlakyTransport::unreachable());
    let dispatcher =
        Dispatcher::new(&EisenhowerConfig::default(), store.clone(), flaky.clone()).expect("dispatcher");

    let Response::Priorities { priorities } = dispatcher.handle(Request::GetPriorities {}).await
    else {
        panic!("expected priorities");
    };
    assert_eq!(priorities.len(), 1);

    let renamed = dispatcher
        .handle(Request::RenameLabel {
            kind: ItemKind::Email,
            id: "AAQkADA1".to_string(),
            label: Some("sync".to_string()),
        })
        .await;
    assert_eq!(
        renamed,
        Response::Renamed {
            id: "AAQkADA1".to_string(),
            applied: true
        }
    );
    let missing = dispatcher
        .handle(Request::RenameLabel {
            kind: ItemKind::Email,
            id: "gone".to_string(),
            label: Some("x".to_string()),
        })
        .await;
    assert_eq!(
        missing,
        Response::Renamed {
            id: "gone".to_string(),
            applied: false
        }
    );

    let matrix = dispatcher.matrix().await.expect("matrix");
    assert_eq!(matrix.total(), 2);
    assert_eq!(matrix.entries(Category::DoFirst)[0].label, "sync");
    assert_eq!(matrix.entries(Category::Delegate)[0].label, "Broken build on main");

    let Response::Export { emails, web_links } = dispatcher.handle(Request::ExportData {}).await
    else {
        panic!("expected export");
    };
    assert_eq!((emails.len(), web_links.len()), (1, 1));
    assert!(flaky.requests().is_empty());
}

#[tokio::test(start_paused = true)]
async fn spawned_sweeper_waits_one_period() {
    let start = Utc.with_ymd_and_hms(2025, 5, 2, 8, 0, 0).single().expect("now");
    let clock = Arc::new(FixedClock::new(start));
    let store = Arc::new(MemoryStore::new());
    store
        .upsert(
            ItemKind::Email,
            PriorityRecord::new("old", "Old thread", 1, 1, start - chrono::Duration::days(29)),
        )
        .await
        .expect("upsert");
    let period = Duration::from_secs(24 * 60 * 60);
    let handle = Sweeper::new(store.clone(), chrono::Duration::days(30), clock.clone()).spawn(period);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(store.get_all(ItemKind::Email).await.expect("all").len(), 1);

    clock.advance(chrono::Duration::days(2));
    tokio::time::sleep(period).await;
    assert!(clock.now() > start);
    assert!(store.get_all(ItemKind::Email).await.expect("all").is_empty());
    handle.abort();
}
