mod common;

use anyhow::Result;
use common::{spawn_actor, Journal};
use serde_json::{json, Value};
use troupe::{exit, next, next_with, Handlers, Reply, SOURCE_ASYNC, SOURCE_INIT};

#[derive(Default)]
struct Counter {
    value: i64,
}

#[tokio::test]
async fn test_handler_receives_state_payload_topic_from() -> Result<()> {
    let handlers = Handlers::new().on("status", |state: &mut troupe::ActorState<Counter>, payload, topic, from| {
        exit(json!({
            "status": "ok",
            "value": state.value,
            "payload": payload,
            "topic": topic,
            "from": from,
        }))
    });
    let (run, controller) = spawn_actor(Counter { value: 42 }, handlers, "test-actor");

    assert!(
        controller
            .deliver("sender", "status", json!({"command": "get_status"}))
            .await
    );

    let result = run.await??;
    assert_eq!(
        result,
        json!({
            "status": "ok",
            "value": 42,
            "payload": {"command": "get_status"},
            "topic": "status",
            "from": "sender",
        })
    );
    Ok(())
}

#[tokio::test]
async fn test_next_chain_with_payload_override() -> Result<()> {
    let handlers = Handlers::new()
        .on("first", |_s: &mut troupe::ActorState<()>, payload, _t, _f| {
            let doubled = payload["v"].as_i64().unwrap() * 2;
            next_with("second", json!({"v": doubled}))
        })
        .on("second", |_s, payload, _t, _f| exit(json!({"value": payload["v"]})));
    let (run, controller) = spawn_actor((), handlers, "test-actor");

    assert!(controller.deliver("x", "first", json!({"v": 42})).await);

    let result = run.await??;
    assert_eq!(result, json!({"value": 84}));
    Ok(())
}

#[tokio::test]
async fn test_next_to_unknown_topic_falls_to_fallback() -> Result<()> {
    // The fallback handler sees the chained topic name, not the original.
    let handlers = Handlers::new()
        .on("first", |_s: &mut troupe::ActorState<()>, _p, _t, _f| next("nope"))
        .fallback(|_s, _p, topic, _f| exit(json!({"t": topic})));
    let (run, controller) = spawn_actor((), handlers, "test-actor");

    assert!(controller.deliver("x", "first", json!({"v": 1})).await);

    let result = run.await??;
    assert_eq!(result, json!({"t": "nope"}));
    Ok(())
}

#[tokio::test]
async fn test_next_without_payload_preserves_original() -> Result<()> {
    let handlers = Handlers::new()
        .on("first", |_s: &mut troupe::ActorState<()>, _p, _t, _f| next("second"))
        .on("second", |_s, payload, _t, _f| exit(json!({"p": payload})));
    let (run, controller) = spawn_actor((), handlers, "test-actor");

    assert!(
        controller
            .deliver("x", "first", json!({"v": 42, "extra": "data"}))
            .await
    );

    let result = run.await??;
    assert_eq!(result, json!({"p": {"v": 42, "extra": "data"}}));
    Ok(())
}

#[tokio::test]
async fn test_from_is_preserved_across_chain() -> Result<()> {
    let handlers = Handlers::new()
        .on("first", |_s: &mut troupe::ActorState<()>, _p, _t, _f| next("second"))
        .on("second", |_s, _p, _t, from| exit(json!({"from": from})));
    let (run, controller) = spawn_actor((), handlers, "test-actor");

    assert!(controller.deliver("origin", "first", json!({})).await);

    let result = run.await??;
    assert_eq!(result, json!({"from": "origin"}));
    Ok(())
}

#[tokio::test]
async fn test_unknown_topic_without_fallback_is_dropped() -> Result<()> {
    let handlers = Handlers::new().on("known", |_s: &mut troupe::ActorState<()>, _p, _t, _f| {
        exit(json!({"handled": "known"}))
    });
    let (run, controller) = spawn_actor((), handlers, "test-actor");

    // The unroutable message is dropped; the loop keeps going.
    assert!(controller.deliver("x", "nope", json!({})).await);
    assert!(controller.deliver("x", "known", json!({})).await);

    let result = run.await??;
    assert_eq!(result, json!({"handled": "known"}));
    Ok(())
}

#[tokio::test]
async fn test_next_with_empty_topic_without_fallback_drops_chain() -> Result<()> {
    let handlers = Handlers::new()
        .on("first", |_s: &mut troupe::ActorState<()>, _p, _t, _f| Reply::Next {
            topic: None,
            payload: None,
        })
        .on("known", |_s, _p, _t, _f| exit(json!({"handled": "known"})));
    let (run, controller) = spawn_actor((), handlers, "test-actor");

    assert!(controller.deliver("x", "first", json!({})).await);
    assert!(controller.deliver("x", "known", json!({})).await);

    let result = run.await??;
    assert_eq!(result, json!({"handled": "known"}));
    Ok(())
}

#[tokio::test]
async fn test_next_with_empty_topic_reaches_fallback_under_default_name() -> Result<()> {
    let handlers = Handlers::new()
        .on("first", |_s: &mut troupe::ActorState<()>, _p, _t, _f| Reply::Next {
            topic: None,
            payload: Some(json!({"carried": true})),
        })
        .fallback(|_s, payload, topic, _f| exit(json!({"topic": topic, "payload": payload})));
    let (run, controller) = spawn_actor((), handlers, "test-actor");

    assert!(controller.deliver("x", "first", json!({})).await);

    let result = run.await??;
    assert_eq!(
        result,
        json!({"topic": troupe::FALLBACK_TOPIC, "payload": {"carried": true}})
    );
    Ok(())
}

#[tokio::test]
async fn test_init_exit_short_circuits_run() -> Result<()> {
    let handlers = Handlers::new()
        .on_init(|_s: &mut troupe::ActorState<()>| exit(json!({"status": "init_exit"})))
        .on("never", |_s, _p, _t, _f| exit(json!({"status": "unreachable"})));
    let (run, _controller) = spawn_actor((), handlers, "test-actor");

    let result = run.await??;
    assert_eq!(result, json!({"status": "init_exit"}));
    Ok(())
}

#[tokio::test]
async fn test_init_next_is_interleaved_with_earlier_inbox_traffic() -> Result<()> {
    // A re-dispatch from init goes through the internal channel, so inbox
    // messages that are already waiting are served first.
    let handlers = Handlers::new()
        .on_init(|_s: &mut troupe::ActorState<Journal>| next_with("boot", json!({})))
        .on("boot", |state, _p, _t, from| {
            state.record(json!({"step": "boot", "from": from}));
            exit(json!(state.entries))
        })
        .on("early", |state, _p, _t, _f| {
            state.record(json!({"step": "early"}));
            Reply::Continue
        });

    let (process, controller) = troupe::ProcessHandle::pair("test-actor");
    assert!(controller.deliver("x", "early", json!({})).await);
    let actor = troupe::Actor::new(Journal::default(), handlers)?.with_process(process);
    let result = tokio::spawn(actor.run()).await??;

    assert_eq!(
        result,
        json!([
            {"step": "early"},
            {"step": "boot", "from": SOURCE_INIT},
        ])
    );
    Ok(())
}

#[tokio::test]
async fn test_add_handler_routes_subsequent_messages() -> Result<()> {
    let handlers = Handlers::new().on("setup", |state: &mut troupe::ActorState<()>, _p, _t, _f| {
        state
            .add_handler("added", |_s, payload, _t, _f| exit(json!({"added": payload})))
            .unwrap();
        Reply::Continue
    });
    let (run, controller) = spawn_actor((), handlers, "test-actor");

    assert!(controller.deliver("x", "setup", json!({})).await);
    assert!(controller.deliver("x", "added", json!({"n": 3})).await);

    let result = run.await??;
    assert_eq!(result, json!({"added": {"n": 3}}));
    Ok(())
}

#[tokio::test]
async fn test_remove_handler_falls_back_to_fallback() -> Result<()> {
    let handlers = Handlers::new()
        .on("temp", |_s: &mut troupe::ActorState<()>, _p, _t, _f| {
            exit(json!({"handled": "temp"}))
        })
        .on("teardown", |state, _p, _t, _f| {
            assert!(state.remove_handler("temp"));
            Reply::Continue
        })
        .fallback(|_s, _p, topic, _f| exit(json!({"fell_back": topic})));
    let (run, controller) = spawn_actor((), handlers, "test-actor");

    assert!(controller.deliver("x", "teardown", json!({})).await);
    assert!(controller.deliver("x", "temp", json!({})).await);

    let result = run.await??;
    assert_eq!(result, json!({"fell_back": "temp"}));
    Ok(())
}

#[tokio::test]
async fn test_async_bridge_reenters_dispatch() -> Result<()> {
    let handlers = Handlers::new()
        .on("work", |state: &mut troupe::ActorState<()>, _p, _t, _f| {
            state.spawn_async(async {
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
                next_with("done", json!({"n": 7}))
            });
            Reply::Continue
        })
        .on("done", |_s, payload, _t, from| {
            exit(json!({"payload": payload, "from": from}))
        });
    let (run, controller) = spawn_actor((), handlers, "test-actor");

    assert!(controller.deliver("x", "work", json!({})).await);

    let result = run.await??;
    assert_eq!(result, json!({"payload": {"n": 7}, "from": SOURCE_ASYNC}));
    Ok(())
}

#[tokio::test]
async fn test_async_non_next_reply_is_discarded() -> Result<()> {
    let handlers = Handlers::new()
        .on("work", |state: &mut troupe::ActorState<()>, _p, _t, _f| {
            state.spawn_async(async { Reply::Continue });
            Reply::Continue
        })
        .on("check", |_s, _p, _t, _f| exit(json!({"status": "still_running"})));
    let (run, controller) = spawn_actor((), handlers, "test-actor");

    assert!(controller.deliver("x", "work", json!({})).await);
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    assert!(controller.deliver("x", "check", json!({})).await);

    let result = run.await??;
    assert_eq!(result, json!({"status": "still_running"}));
    Ok(())
}

#[tokio::test]
async fn test_handler_panic_aborts_run() {
    let handlers = Handlers::new().on("boom", |_s: &mut troupe::ActorState<()>, _p, _t, _f| {
        panic!("handler blew up");
    });
    let (run, controller) = spawn_actor((), handlers, "test-actor");

    assert!(controller.deliver("x", "boom", json!({})).await);

    let joined = run.await;
    assert!(joined.is_err());
    assert!(joined.unwrap_err().is_panic());
}

#[tokio::test]
async fn test_run_without_process_fails() {
    let actor = troupe::Actor::new((), Handlers::<()>::new()).unwrap();
    match actor.run().await {
        Err(troupe::ActorError::ProcessNotAttached) => {}
        other => panic!("expected ProcessNotAttached, got {:?}", other.map(|_| Value::Null)),
    }
}
