//! Integration tests for a room view: typing plus submitted input.
//!
//! Verifies:
//! 1. Plain lines reach the room as messages, directives as one operation.
//! 2. Submitting ends the typing episode; an empty submit does not.
//! 3. Ignored lines make no room call.
//! 4. Permission failures on directives surface as notices.
//! 5. Switching rooms or closing the view flushes the old room's typing-stop.
//! 6. Invites complete bare names with the local user's server; leaving
//!    flushes the typing-stop before the leave request.

use std::sync::Arc;
use std::time::Duration;

use roomchat::clock::TokioClock;
use roomchat::command::{DispatchNotice, DispatchOutcome};
use roomchat::gateway::loopback::{GatewayCall, GatewayOp, LoopbackGateway};
use roomchat::room_view::{RoomView, RoomViewConfig};

use roomchat_proto::command::{Directive, Ignored};
use roomchat_proto::error::{ErrorCode, GatewayError};
use roomchat_proto::room::{RoomId, UserId};
use roomchat_proto::typing::TypingNotice;

use tokio::sync::mpsc;

type TestView = RoomView<LoopbackGateway, TokioClock>;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn gateway(room: &str) -> Arc<LoopbackGateway> {
    let (gw, _calls) = LoopbackGateway::new(RoomId::new(room));
    Arc::new(gw)
}

fn open(gw: &Arc<LoopbackGateway>) -> (TestView, mpsc::Receiver<DispatchNotice>) {
    RoomView::open(
        gw.room_id().clone(),
        Arc::clone(gw),
        TokioClock,
        RoomViewConfig::default(),
    )
}

/// Open a view as the local user `user`.
fn open_as(gw: &Arc<LoopbackGateway>, user: &str) -> (TestView, mpsc::Receiver<DispatchNotice>) {
    let config = RoomViewConfig {
        user_id: UserId::new(user),
        ..RoomViewConfig::default()
    };
    RoomView::open(gw.room_id().clone(), Arc::clone(gw), TokioClock, config)
}

/// Let the typing worker and spawned gateway calls drain (paused clock).
async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

/// Every call except typing notices, in order.
fn room_calls(gw: &LoopbackGateway) -> Vec<GatewayCall> {
    gw.calls()
        .into_iter()
        .filter(|call| call.op() != GatewayOp::Typing)
        .collect()
}

fn start() -> TypingNotice {
    TypingNotice::started(Duration::from_secs(20))
}

fn stop() -> TypingNotice {
    TypingNotice::stopped()
}

// ---------------------------------------------------------------------------
// Submitting input
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn typed_message_is_sent_and_ends_typing() {
    let gw = gateway("!room:example.org");
    let (view, _notices) = open(&gw);

    for draft in ["h", "he", "hello"] {
        view.on_input_changed(draft).unwrap();
    }
    settle().await;
    assert_eq!(gw.typing_notices(), vec![start()]);

    let outcome = view.submit("hello").await.unwrap();
    settle().await;

    assert_eq!(outcome, DispatchOutcome::SentMessage);
    assert_eq!(room_calls(&gw), vec![GatewayCall::TextMessage("hello".into())]);
    assert_eq!(gw.typing_notices(), vec![start(), stop()]);
}

#[tokio::test(start_paused = true)]
async fn directive_makes_one_call_and_ends_typing() {
    let gw = gateway("!room:example.org");
    let (view, _notices) = open(&gw);

    view.on_input_changed("/kick bob").unwrap();
    settle().await;
    let outcome = view.submit("/kick bob").await.unwrap();
    settle().await;

    assert_eq!(outcome, DispatchOutcome::Executed);
    assert!(outcome.is_directive());
    assert_eq!(room_calls(&gw), vec![GatewayCall::Kick(UserId::new("bob"))]);
    assert_eq!(gw.typing_notices(), vec![start(), stop()]);
}

#[tokio::test(start_paused = true)]
async fn message_with_leading_text_is_not_a_directive() {
    let gw = gateway("!room:example.org");
    let (view, _notices) = open(&gw);

    view.submit("see /kick bob").await.unwrap();
    view.submit("/kickbob").await.unwrap();

    assert_eq!(
        room_calls(&gw),
        vec![GatewayCall::TextMessage("see /kick bob".into())]
    );
}

#[tokio::test(start_paused = true)]
async fn ignored_lines_make_no_room_call() {
    let gw = gateway("!room:example.org");
    let (view, _notices) = open(&gw);

    assert_eq!(
        view.submit("/wat now").await.unwrap(),
        DispatchOutcome::Ignored(Ignored::UnknownDirective {
            name: "/wat".into()
        })
    );
    assert_eq!(
        view.submit("/ban").await.unwrap(),
        DispatchOutcome::Ignored(Ignored::MissingArgument {
            directive: Directive::Ban
        })
    );
    assert_eq!(
        view.submit("/op bob lots").await.unwrap(),
        DispatchOutcome::Ignored(Ignored::MalformedPowerLevel {
            user: UserId::new("bob"),
            raw: "lots".into()
        })
    );
    settle().await;

    assert!(gw.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn empty_submit_keeps_typing_episode() {
    let gw = gateway("!room:example.org");
    let (view, _notices) = open(&gw);

    view.on_input_changed("draft").unwrap();
    settle().await;

    assert_eq!(
        view.submit("   ").await.unwrap(),
        DispatchOutcome::Ignored(Ignored::EmptyInput)
    );
    settle().await;

    assert_eq!(gw.typing_notices(), vec![start()]);
}

#[tokio::test(start_paused = true)]
async fn deop_resets_to_default_level() {
    let gw = gateway("!room:example.org");
    let (view, _notices) = open(&gw);

    view.submit("/op bob 100").await.unwrap();
    view.submit("/deop bob").await.unwrap();

    let bob = UserId::new("bob");
    assert_eq!(
        room_calls(&gw),
        vec![
            GatewayCall::SetPowerLevel(bob.clone(), 100),
            GatewayCall::SetPowerLevel(bob, 0),
        ]
    );
}

// ---------------------------------------------------------------------------
// Errors and notices
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn forbidden_directive_surfaces_notice() {
    let gw = gateway("!room:example.org");
    let (view, mut notices) = open(&gw);
    gw.fail_next(
        GatewayOp::SetPowerLevel,
        GatewayError::forbidden("You don't have permission to change power levels"),
    );

    let err = view.submit("/op bob 100").await.unwrap_err();

    assert!(err.is_forbidden());
    assert_eq!(
        notices.try_recv().unwrap(),
        DispatchNotice::Forbidden {
            message: "You don't have permission to change power levels".into()
        }
    );
}

#[tokio::test(start_paused = true)]
async fn failed_message_reports_error_without_notice() {
    let gw = gateway("!room:example.org");
    let (view, mut notices) = open(&gw);
    gw.fail_next(
        GatewayOp::TextMessage,
        GatewayError::new(ErrorCode::Network, "offline"),
    );

    let err = view.submit("hello").await.unwrap_err();

    assert_eq!(err.code, ErrorCode::Network);
    assert!(notices.try_recv().is_err());
}

// ---------------------------------------------------------------------------
// Invites
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn invite_completes_bare_names_with_own_server() {
    let gw = gateway("!room:example.org");
    let (view, _notices) = open_as(&gw, "@alice:example.org");

    let invited = view.invite("bob, @carol:other.net dave").await.unwrap();

    let expected = vec![
        UserId::new("@bob:example.org"),
        UserId::new("@carol:other.net"),
        UserId::new("@dave:example.org"),
    ];
    assert_eq!(invited, expected);
    assert_eq!(room_calls(&gw), vec![GatewayCall::Invite(expected)]);
}

#[tokio::test(start_paused = true)]
async fn blank_invite_makes_no_call() {
    let gw = gateway("!room:example.org");
    let (view, _notices) = open_as(&gw, "@alice:example.org");

    assert!(view.invite(" ,  ").await.unwrap().is_empty());
    assert!(gw.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn forbidden_invite_surfaces_notice() {
    let gw = gateway("!room:example.org");
    let (view, mut notices) = open_as(&gw, "@alice:example.org");
    gw.fail_next(GatewayOp::Invite, GatewayError::forbidden("not allowed to invite"));

    assert!(view.invite("bob").await.unwrap_err().is_forbidden());
    assert_eq!(
        notices.try_recv().unwrap(),
        DispatchNotice::Forbidden {
            message: "not allowed to invite".into()
        }
    );
}

// ---------------------------------------------------------------------------
// Switching, closing and leaving
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn join_then_switch_moves_typing_to_new_room() {
    let lobby = gateway("!lobby:example.org");
    let (mut view, _notices) = open(&lobby);

    view.on_input_changed("/join #rust:example.org").unwrap();
    settle().await;
    let DispatchOutcome::JoinedRoom(joined) =
        view.submit("/join #rust:example.org").await.unwrap()
    else {
        panic!("expected a joined room");
    };
    assert_eq!(joined, RoomId::new("!rust:example.org"));

    let rust = gateway(joined.as_str());
    let _notices = view.switch_room(joined.clone(), Arc::clone(&rust)).await;
    assert_eq!(view.room_id(), &joined);

    view.on_input_changed("hi").unwrap();
    settle().await;
    view.submit("hi").await.unwrap();
    settle().await;

    assert_eq!(lobby.typing_notices(), vec![start(), stop()]);
    assert_eq!(
        room_calls(&lobby),
        vec![GatewayCall::JoinRoom("#rust:example.org".into())]
    );
    assert_eq!(rust.typing_notices(), vec![start(), stop()]);
    assert_eq!(room_calls(&rust), vec![GatewayCall::TextMessage("hi".into())]);
}

#[tokio::test(start_paused = true)]
async fn switch_room_flushes_stop_to_old_room() {
    let first = gateway("!first:example.org");
    let second = gateway("!second:example.org");
    let (mut view, _old_notices) = open(&first);

    view.on_input_changed("half a thought").unwrap();
    settle().await;

    let mut notices = view
        .switch_room(second.room_id().clone(), Arc::clone(&second))
        .await;
    settle().await;

    assert_eq!(first.typing_notices(), vec![start(), stop()]);
    assert!(second.calls().is_empty());

    // The returned receiver carries the new room's notices.
    second.fail_next(GatewayOp::Kick, GatewayError::forbidden("not a moderator"));
    assert!(view.submit("/kick bob").await.is_err());
    assert_eq!(
        notices.try_recv().unwrap(),
        DispatchNotice::Forbidden {
            message: "not a moderator".into()
        }
    );

    // No stray stop reaches the old room once its window would have ended.
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(first.typing_notices(), vec![start(), stop()]);
}

#[tokio::test(start_paused = true)]
async fn close_flushes_stop() {
    let gw = gateway("!room:example.org");
    let (view, _notices) = open(&gw);

    view.on_input_changed("bye").unwrap();
    settle().await;
    view.close().await.unwrap();
    settle().await;

    assert_eq!(gw.typing_notices(), vec![start(), stop()]);
}

#[tokio::test(start_paused = true)]
async fn leave_flushes_stop_then_leaves() {
    let gw = gateway("!room:example.org");
    let (view, _notices) = open(&gw);

    view.on_input_changed("gotta go").unwrap();
    settle().await;
    view.leave().await.unwrap();
    settle().await;

    assert_eq!(
        gw.calls(),
        vec![
            GatewayCall::Typing(start()),
            GatewayCall::Typing(stop()),
            GatewayCall::Leave,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn close_without_typing_sends_nothing() {
    let gw = gateway("!room:example.org");
    let (view, _notices) = open(&gw);

    view.close().await.unwrap();
    settle().await;

    assert!(gw.calls().is_empty());
}
