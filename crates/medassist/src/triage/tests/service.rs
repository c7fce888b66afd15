use std::sync::Arc;

use tokio::sync::Notify;

use super::common::*;
use crate::triage::domain::DecisionCategory;
use crate::triage::error::{BookingError, OracleError, TriageError};
use crate::triage::reassessment::{FOLLOW_UP_HEADER, ORIGINAL_SITUATION_HEADER};
use crate::triage::repository::SessionStoreError;
use crate::triage::service::TriageServiceError;
use crate::triage::session::{SessionError, SessionId};

#[tokio::test]
async fn assess_records_the_decision_on_the_session() {
    let (service, oracle, _) = build_service(
        ScriptedOracle::new(vec![Ok(scores(75.0, 20.0))]),
        CountingBooker::confirming("MA-00000001"),
    );
    let session = service.create_session().expect("session opens");

    let view = service
        .assess(
            &session.session_id,
            profile(),
            "mild cough for 2 days".to_string(),
        )
        .await
        .expect("assessment succeeds");

    let decision = view.latest_decision.expect("decision stored");
    assert_eq!(decision.category, DecisionCategory::ActWithWarning);
    assert_eq!(view.situation_history, vec!["mild cough for 2 days".to_string()]);
    assert_eq!(view.profile, profile());
    assert!(!view.busy);
    assert_eq!(oracle.calls().len(), 1);
}

#[tokio::test]
async fn follow_up_round_merges_answers_and_supersedes_the_decision() {
    let (service, oracle, _) = build_service(
        ScriptedOracle::new(vec![
            Ok(missing_info(&["How long?", "Any fever?"])),
            Ok(missing_info(&["How high was the fever?"])),
            Ok(scores(70.0, 45.0)),
        ]),
        CountingBooker::confirming("MA-00000001"),
    );
    let id = service.create_session().expect("session opens").session_id;

    let first = service
        .assess(&id, profile(), "S1".to_string())
        .await
        .expect("first round");
    assert_eq!(
        first.latest_decision.map(|d| d.category),
        Some(DecisionCategory::AskForMoreInfo)
    );

    let second = service
        .reassess(&id, "A1".to_string())
        .await
        .expect("second round");
    assert_eq!(
        second.latest_decision.map(|d| d.category),
        Some(DecisionCategory::AskForMoreInfo)
    );

    let third = service
        .reassess(&id, "A2".to_string())
        .await
        .expect("third round");
    assert_eq!(
        third.latest_decision.map(|d| d.category),
        Some(DecisionCategory::SuggestAppointment)
    );

    assert_eq!(third.situation_history.len(), 3);
    assert_eq!(third.situation_history[0], "S1");
    let latest = third.situation_history.last().expect("latest situation");
    assert!(latest.starts_with(ORIGINAL_SITUATION_HEADER));
    assert!(latest.contains(FOLLOW_UP_HEADER));
    assert!(latest.find("S1") < latest.find("A1"));
    assert!(latest.find("A1") < latest.find("A2"));

    let calls = oracle.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(&calls[2].1, latest);
}

#[tokio::test]
async fn oracle_failure_is_reported_and_recorded() {
    let (service, _, _) = build_service(
        ScriptedOracle::new(vec![Err(OracleError::Unavailable("timed out".to_string()))]),
        CountingBooker::confirming("MA-00000001"),
    );
    let id = service.create_session().expect("session opens").session_id;

    let err = service
        .assess(&id, profile(), "headache".to_string())
        .await
        .expect_err("oracle down");

    assert!(matches!(
        err,
        TriageServiceError::Session(SessionError::Triage(TriageError::Oracle(
            OracleError::Unavailable(_)
        )))
    ));
    let view = service.view(&id).expect("session exists");
    assert!(view.latest_decision.is_none());
    assert_eq!(
        view.latest_error.as_deref(),
        Some("Failed to get assessment. scoring oracle unavailable: timed out")
    );
}

#[tokio::test]
async fn booking_is_issued_once_and_cleared_by_a_new_assessment() {
    let (service, _, booker) = build_service(
        ScriptedOracle::new(vec![Ok(scores(70.0, 40.0)), Ok(scores(70.0, 40.0))]),
        CountingBooker::confirming("MA-1234ABCD"),
    );
    let id = service.create_session().expect("session opens").session_id;
    service
        .assess(&id, profile(), "sprained ankle".to_string())
        .await
        .expect("assessment succeeds");

    let first = service.book_appointment(&id).await.expect("booking succeeds");
    let second = service.book_appointment(&id).await.expect("idempotent");
    assert_eq!(first, second);
    assert_eq!(booker.calls(), 1);

    let view = service
        .assess(&id, profile(), "sprained ankle, now swollen".to_string())
        .await
        .expect("new assessment");
    assert!(view.booking_confirmation.is_none());

    service.book_appointment(&id).await.expect("books again");
    assert_eq!(booker.calls(), 2);
}

#[tokio::test]
async fn booking_failure_is_non_fatal() {
    let (service, _, _) = build_service(
        ScriptedOracle::new(vec![Ok(scores(70.0, 40.0))]),
        CountingBooker::failing(BookingError::Declined),
    );
    let id = service.create_session().expect("session opens").session_id;
    service
        .assess(&id, profile(), "sprained ankle".to_string())
        .await
        .expect("assessment succeeds");

    let err = service.book_appointment(&id).await.expect_err("declined");
    assert!(matches!(
        err,
        TriageServiceError::Session(SessionError::Booking(BookingError::Declined))
    ));

    let view = service.view(&id).expect("session exists");
    assert!(view.latest_decision.is_some());
    assert!(view.booking_confirmation.is_none());
    assert!(!view.busy);
}

#[tokio::test]
async fn abandoned_round_result_is_discarded() {
    let gate = Arc::new(Notify::new());
    let (service, _, _) = build_service(
        ScriptedOracle::gated(
            vec![Ok(scores(90.0, 10.0)), Ok(scores(75.0, 20.0))],
            gate.clone(),
        ),
        CountingBooker::confirming("MA-00000001"),
    );
    let id = service.create_session().expect("session opens").session_id;

    let slow = {
        let service = service.clone();
        let id = id.clone();
        tokio::spawn(async move {
            service
                .assess(&id, profile(), "first description".to_string())
                .await
        })
    };

    while !service.view(&id).expect("session exists").busy {
        tokio::task::yield_now().await;
    }

    assert!(matches!(
        service
            .assess(&id, profile(), "second description".to_string())
            .await,
        Err(TriageServiceError::Session(SessionError::Busy))
    ));

    assert!(service.abandon(&id).expect("session exists"));
    let fresh = service
        .assess(&id, profile(), "second description".to_string())
        .await
        .expect("fresh round");

    gate.notify_one();
    let stale = slow.await.expect("task joins");

    assert!(matches!(
        stale,
        Err(TriageServiceError::Session(SessionError::Superseded))
    ));
    let view = service.view(&id).expect("session exists");
    assert_eq!(
        view.latest_decision.map(|d| d.category),
        fresh.latest_decision.map(|d| d.category)
    );
    assert_eq!(view.situation_history, vec!["second description".to_string()]);
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let (service, _, _) = build_service(
        ScriptedOracle::default(),
        CountingBooker::confirming("MA-00000001"),
    );

    let err = service
        .view(&SessionId("session-missing".to_string()))
        .expect_err("no such session");
    assert!(matches!(
        err,
        TriageServiceError::Store(SessionStoreError::NotFound)
    ));
}
