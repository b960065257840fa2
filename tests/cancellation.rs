//! Tests for dropping and canceling interrogation sessions

mod common;

use bo_tie_interrogator::hci::opcodes::LinkControl;
use bo_tie_interrogator::interrogator::Error;
use bo_tie_interrogator::BluetoothDeviceAddress;
use common::*;
use std::cell::RefCell;
use std::task::Poll;

#[tokio::test]
async fn dropped_session_never_calls_back() {
    let (interrogator, peer_id) = setup();

    let controller = interrogator.channel();

    let results: RefCell<Vec<InterrogationResult>> = RefCell::default();

    let mut session = interrogator.start(peer_id, connection_handle(), |result| {
        results.borrow_mut().push(result)
    });

    assert_eq!(Poll::Pending, futures::poll!(&mut session));

    assert_eq!(1, interrogator.active_sessions());

    drop(session);

    assert_eq!(0, interrogator.active_sessions());

    // the completions of the dropped session are gone
    assert!(!controller.deliver(remote_name_request_complete(PEER_ADDRESS, PEER_NAME)));

    assert!(results.borrow().is_empty());
    assert!(peer(&interrogator, peer_id).borrow().name().is_none());
}

#[tokio::test]
async fn cancel_calls_back_with_canceled() {
    let (interrogator, peer_id) = setup();

    let controller = interrogator.channel();

    let results: RefCell<Vec<InterrogationResult>> = RefCell::default();

    let mut session = interrogator.start(peer_id, connection_handle(), |result| {
        results.borrow_mut().push(result)
    });

    assert_eq!(Poll::Pending, futures::poll!(&mut session));

    assert!(controller.fail(
        LinkControl::RemoteNameRequest,
        bo_tie_interrogator::hci::CommandFailure::Timeout
    ));

    assert_eq!(1, interrogator.cancel(peer_id));

    assert_eq!(Poll::Ready(()), futures::poll!(&mut session));

    // a canceled session does not report the errors of its procedures
    assert_eq!(vec![Err(Error::Canceled)], *results.borrow());

    // events arriving after cancellation are ignored
    assert!(!controller.deliver(read_remote_version_info_complete(connection_handle())));
    assert!(peer(&interrogator, peer_id).borrow().version().is_none());

    assert_eq!(Poll::Ready(()), futures::poll!(&mut session));
    assert_eq!(1, results.borrow().len());

    assert_eq!(0, interrogator.cancel(peer_id));
    assert_eq!(0, interrogator.active_sessions());
}

#[tokio::test]
async fn cancel_before_first_poll() {
    let (interrogator, peer_id) = setup();

    let results: RefCell<Vec<InterrogationResult>> = RefCell::default();

    let mut session = interrogator.start(peer_id, connection_handle(), |result| {
        results.borrow_mut().push(result)
    });

    assert_eq!(1, interrogator.cancel(peer_id));

    assert_eq!(Poll::Ready(()), futures::poll!(&mut session));

    assert_eq!(vec![Err(Error::Canceled)], *results.borrow());
    assert!(interrogator.channel().sent_commands().is_empty());
}

#[tokio::test]
async fn cancel_only_affects_the_peer() {
    let (interrogator, peer_a) = setup();

    let peer_b = interrogator
        .peers()
        .borrow_mut()
        .get_or_create(BluetoothDeviceAddress([2, 0, 0, 0, 0, 0]))
        .borrow()
        .identifier();

    let handle_b = bo_tie_interrogator::ConnectionHandle::try_from(0x0001).unwrap();

    let controller = interrogator.channel();

    let results_a: RefCell<Vec<InterrogationResult>> = RefCell::default();
    let results_b: RefCell<Vec<InterrogationResult>> = RefCell::default();

    let mut session_a = interrogator.start(peer_a, connection_handle(), |result| {
        results_a.borrow_mut().push(result)
    });

    let mut session_b = interrogator.start(peer_b, handle_b, |result| results_b.borrow_mut().push(result));

    assert_eq!(peer_b, session_b.peer_id());
    assert_eq!(handle_b, session_b.connection_handle());

    assert_eq!(Poll::Pending, futures::poll!(&mut session_a));
    assert_eq!(Poll::Pending, futures::poll!(&mut session_b));

    assert_eq!(2, interrogator.active_sessions());

    assert_eq!(1, interrogator.cancel(peer_a));

    assert_eq!(Poll::Ready(()), futures::poll!(&mut session_a));

    drop(session_a);

    // the canceled session's commands are no longer awaited, the rest belong to peer b
    run_to_completion(&mut session_b, controller).await;

    assert_eq!(vec![Err(Error::Canceled)], *results_a.borrow());
    assert_eq!(vec![Ok(())], *results_b.borrow());

    assert!(peer(&interrogator, peer_a).borrow().name().is_none());
    assert_eq!(Some(PEER_NAME), peer(&interrogator, peer_b).borrow().name());
    assert_eq!(0, interrogator.active_sessions());
}

#[tokio::test]
async fn dropped_session_does_not_remove_a_newer_session() {
    let (interrogator, peer_id) = setup();

    let first = interrogator.start(peer_id, connection_handle(), |_| ());

    // canceling frees the entry of the first session for reuse
    assert_eq!(1, interrogator.cancel(peer_id));

    let results: RefCell<Vec<InterrogationResult>> = RefCell::default();

    let mut second = interrogator.start(peer_id, connection_handle(), |result| {
        results.borrow_mut().push(result)
    });

    drop(first);

    assert_eq!(1, interrogator.active_sessions());

    assert_eq!(Poll::Pending, futures::poll!(&mut second));

    assert_eq!(1, interrogator.cancel(peer_id));

    assert_eq!(Poll::Ready(()), futures::poll!(&mut second));

    assert_eq!(vec![Err(Error::Canceled)], *results.borrow());
}
