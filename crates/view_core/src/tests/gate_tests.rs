use super::*;

use std::cell::Cell;

use anyhow::anyhow;

use crate::{
    query::CacheEvent,
    test_support::{next_event, ScriptedQuery},
};

#[derive(Debug, Clone, PartialEq)]
enum Act {
    Retry(Retry),
    Reload,
}

impl From<Retry> for Act {
    fn from(value: Retry) -> Self {
        Act::Retry(value)
    }
}

fn render_value(gate: &mut AsyncGate<Act>, cache: &QueryCache, query: &ScriptedQuery) -> View<Act> {
    gate.render(cache, |scope| {
        let value = scope.read(query)?;
        Ok(View::text(format!("value {value}")))
    })
}

#[tokio::test]
async fn shows_pending_fallback_until_the_read_resolves() {
    let cache = QueryCache::try_current().expect("runtime");
    let mut events = cache.subscribe();
    let query = ScriptedQuery::new("home/main");
    let mut gate = AsyncGate::new("home");

    let view = render_value(&mut gate, &cache, &query);
    assert_eq!(view, View::Spinner);
    assert!(!view.contains_text("value"));
    assert_eq!(gate.status(), GateStatus::Pending);
    assert!(gate.waits_on(&query.key()));

    query.release.notify_one();
    next_event(&mut events).await;

    let view = render_value(&mut gate, &cache, &query);
    assert_eq!(view, View::text("value 7"));
    assert!(!view.is_spinner());
    assert_eq!(gate.status(), GateStatus::Ready);
}

#[tokio::test]
async fn rejected_read_shows_message_and_retry_then_recovers() {
    let cache = QueryCache::try_current().expect("runtime");
    let mut events = cache.subscribe();
    let query = ScriptedQuery::new("notifications").failing_first(1);
    let mut gate = AsyncGate::new("notifications");

    assert!(render_value(&mut gate, &cache, &query).is_spinner());
    query.release.notify_one();
    next_event(&mut events).await;

    let view = render_value(&mut gate, &cache, &query);
    assert_eq!(gate.status(), GateStatus::Rejected);
    assert!(view.contains_text(DEFAULT_REJECTED_TITLE));
    assert!(view.contains_text("network error"));
    let retry = match view.find_action(DEFAULT_RETRY_LABEL) {
        Some(Act::Retry(retry)) => retry.clone(),
        other => panic!("expected retry action, got {other:?}"),
    };
    assert_eq!(retry.gate(), "notifications");
    let err = gate.error().expect("held error");
    assert_eq!(err.message(), "network error");
    assert_eq!(err.key(), Some(&query.key()));

    retry.request();
    let view = render_value(&mut gate, &cache, &query);
    assert_eq!(view, View::Spinner);
    assert_eq!(gate.status(), GateStatus::Pending);
    assert!(gate.error().is_none());

    query.release.notify_one();
    loop {
        if let CacheEvent::Settled { ok, .. } = next_event(&mut events).await {
            assert!(ok);
            break;
        }
    }

    assert_eq!(query.calls(), 2);

    let view = render_value(&mut gate, &cache, &query);
    assert_eq!(view, View::text("value 7"));
    assert!(!view.contains_text("network error"));
    assert_eq!(gate.status(), GateStatus::Ready);
}

#[tokio::test]
async fn failed_background_refresh_keeps_children_on_screen() {
    let cache = QueryCache::try_current().expect("runtime");
    let mut events = cache.subscribe();
    let query = ScriptedQuery::new("home/main");
    let mut gate = AsyncGate::new("home");

    render_value(&mut gate, &cache, &query);
    query.release.notify_one();
    next_event(&mut events).await;
    assert_eq!(render_value(&mut gate, &cache, &query), View::text("value 7"));

    query.set_failing(true);
    cache.refetch(&query);
    query.release.notify_one();
    assert!(matches!(
        next_event(&mut events).await,
        CacheEvent::Settled { ok: false, .. }
    ));

    let view = render_value(&mut gate, &cache, &query);
    assert_eq!(view, View::text("value 7"));
    assert!(!view.contains_text("network error"));
    assert_eq!(gate.status(), GateStatus::Ready);
}

#[tokio::test]
async fn held_error_skips_children_until_retry() {
    let cache = QueryCache::try_current().expect("runtime");
    let evaluations = Cell::new(0);
    let mut gate: AsyncGate<Act> = AsyncGate::new("profile");

    for _ in 0..3 {
        let view = gate.render(&cache, |_| {
            evaluations.set(evaluations.get() + 1);
            Err(anyhow!("layout exploded").into())
        });
        assert!(view.contains_text("layout exploded"));
    }
    assert_eq!(evaluations.get(), 1);

    gate.retry(&cache);
    assert_eq!(gate.status(), GateStatus::Pending);
    let view = gate.render(&cache, |_| {
        evaluations.set(evaluations.get() + 1);
        Ok(View::text("recovered"))
    });
    assert_eq!(view, View::text("recovered"));
    assert_eq!(evaluations.get(), 2);
}

#[tokio::test]
async fn errors_raised_with_question_mark_are_caught() {
    let cache = QueryCache::try_current().expect("runtime");
    let mut gate: AsyncGate<Act> = AsyncGate::new("receipt");

    let view = gate.render(&cache, |_| {
        let price: u32 = "not a number".parse().map_err(anyhow::Error::from)?;
        Ok(View::text(format!("{price}")))
    });
    assert_eq!(gate.status(), GateStatus::Rejected);
    assert!(view.find_action(DEFAULT_RETRY_LABEL).is_some());
    assert!(gate.error().expect("held").key().is_none());
}

#[tokio::test]
async fn custom_fallbacks_replace_the_defaults() {
    let cache = QueryCache::try_current().expect("runtime");
    let query = ScriptedQuery::new("catalog");
    let mut gate = AsyncGate::new("catalog")
        .pending_fallback(|| View::text("loading catalog"))
        .rejected_fallback(|err, retry| {
            View::column([
                View::text(format!("catalog failed: {}", err.message())),
                View::button("Reload", Act::Retry(retry)),
                View::button("Skip", Act::Reload),
            ])
        });

    assert_eq!(
        render_value(&mut gate, &cache, &query),
        View::text("loading catalog")
    );

    let view = gate.render(&cache, |_| Err(GateError::new("offline").into()));
    assert!(view.contains_text("catalog failed: offline"));
    assert!(matches!(view.find_action("Reload"), Some(Act::Retry(_))));
    assert!(!view.contains_text(DEFAULT_REJECTED_TITLE));
}

#[tokio::test]
async fn nested_gate_contains_its_own_failure() {
    let cache = QueryCache::try_current().expect("runtime");
    let mut outer: AsyncGate<Act> = AsyncGate::new("outer");
    let mut inner: AsyncGate<Act> = AsyncGate::new("inner");

    let view = outer.render(&cache, |scope| {
        let nested = inner.render(scope.cache(), |_| Err(GateError::new("inner broke").into()));
        Ok(View::column([View::heading("outer"), nested]))
    });

    assert_eq!(outer.status(), GateStatus::Ready);
    assert_eq!(inner.status(), GateStatus::Rejected);
    assert!(view.contains_text("outer"));
    assert!(view.contains_text("inner broke"));
}

#[tokio::test]
async fn retry_without_recorded_reads_resets_every_failed_entry() {
    let cache = QueryCache::try_current().expect("runtime");
    let mut events = cache.subscribe();
    let query = ScriptedQuery::new("orphan").failing_first(1);

    assert!(cache.read(&query).is_pending());
    query.release.notify_one();
    next_event(&mut events).await;
    assert!(cache.read(&query).is_rejected());

    let mut gate: AsyncGate<Act> = AsyncGate::new("detached");
    gate.render(&cache, |_| Err(GateError::new("boom").into()));
    gate.retry(&cache);

    assert_eq!(cache.state(&query.key()), None);
}

#[tokio::test]
#[should_panic(expected = "render bug")]
async fn panics_in_children_are_not_caught() {
    let cache = QueryCache::try_current().expect("runtime");
    let mut gate: AsyncGate<Act> = AsyncGate::new("panicky");
    gate.render(&cache, |_| panic!("render bug"));
}
