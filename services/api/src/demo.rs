use crate::infra::InMemorySessionStore;
use async_trait::async_trait;
use clap::Args;
use medassist::config::AppConfig;
use medassist::error::AppError;
use medassist::triage::{
    compose_answers, AIDecision, AppointmentBooker, DecisionCategory, DecisionClassifier,
    HttpScoringOracle, OracleError, PatientProfile, ScoringOracle, ScoringResult, SessionError,
    SessionId, SessionStore, SessionView, SimulatedBooker, TriageService, TriageServiceError,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

const DEMO_SITUATION: &str =
    "I've had a fever and a cough for a few days and now my chest hurts when I breathe in.";

const DEMO_ANSWERS: [&str; 2] = [
    "38.9C this morning, it has not dropped below 38 for three days",
    "Mild wheezing when climbing stairs, no trouble breathing at rest",
];

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Simulated latency of the booking step in milliseconds
    #[arg(long, default_value_t = 250)]
    pub(crate) booking_latency_ms: u64,
    /// Stop after the follow-up round instead of booking an appointment
    #[arg(long)]
    pub(crate) skip_booking: bool,
}

impl Default for DemoArgs {
    fn default() -> Self {
        Self {
            booking_latency_ms: 250,
            skip_booking: false,
        }
    }
}

#[derive(Args, Debug)]
pub(crate) struct AssessArgs {
    /// Description of the current situation
    #[arg(long)]
    pub(crate) situation: String,
    /// Patient age
    #[arg(long)]
    pub(crate) age: Option<String>,
    /// Pre-existing conditions
    #[arg(long)]
    pub(crate) conditions: Option<String>,
    /// Known allergies
    #[arg(long)]
    pub(crate) allergies: Option<String>,
    /// Current medications
    #[arg(long)]
    pub(crate) medications: Option<String>,
    /// Book an appointment when the final decision allows it
    #[arg(long)]
    pub(crate) book: bool,
}

impl AssessArgs {
    fn profile(&self) -> PatientProfile {
        PatientProfile {
            age: self.age.clone().unwrap_or_default(),
            conditions: self.conditions.clone().unwrap_or_default(),
            allergies: self.allergies.clone().unwrap_or_default(),
            medications: self.medications.clone().unwrap_or_default(),
        }
    }
}

/// Oracle that replays a fixed list of scores, one per round.
pub(crate) struct ScriptedOracle {
    script: Mutex<VecDeque<ScoringResult>>,
}

impl ScriptedOracle {
    pub(crate) fn new(script: Vec<ScoringResult>) -> Self {
        Self {
            script: Mutex::new(script.into()),
        }
    }

    /// Vague first description followed by a clearer picture once the questions are answered.
    pub(crate) fn walkthrough() -> Self {
        Self::new(vec![
            ScoringResult {
                confidence: 58.0,
                risk: 52.0,
                is_adversarial: false,
                missing_critical_info: true,
                reasoning: "Chest pain with fever needs the temperature trend and breathing status."
                    .to_string(),
                missing_info_questions: vec![
                    "What is your highest measured temperature and for how long?".to_string(),
                    "Are you short of breath or wheezing?".to_string(),
                ],
            },
            ScoringResult {
                confidence: 74.0,
                risk: 55.0,
                is_adversarial: false,
                missing_critical_info: false,
                reasoning: "Persistent fever with pleuritic pain suggests a chest infection that \
                            should be examined, with no signs of respiratory distress."
                    .to_string(),
                missing_info_questions: Vec::new(),
            },
        ])
    }
}

#[async_trait]
impl ScoringOracle for ScriptedOracle {
    async fn score(
        &self,
        _profile: &PatientProfile,
        _situation: &str,
    ) -> Result<ScoringResult, OracleError> {
        let mut script = self
            .script
            .lock()
            .map_err(|_| OracleError::Unavailable("script mutex poisoned".to_string()))?;
        script
            .pop_front()
            .ok_or_else(|| OracleError::Unavailable("demo script exhausted".to_string()))
    }
}

fn demo_profile() -> PatientProfile {
    PatientProfile {
        age: "46".to_string(),
        conditions: "Type 2 diabetes".to_string(),
        allergies: "Penicillin".to_string(),
        medications: "Metformin 500mg twice daily".to_string(),
    }
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        booking_latency_ms,
        skip_booking,
    } = args;

    let service = TriageService::new(
        Arc::new(InMemorySessionStore::default()),
        Arc::new(ScriptedOracle::walkthrough()),
        Arc::new(SimulatedBooker::new(Duration::from_millis(booking_latency_ms))),
        DecisionClassifier::default(),
    );

    println!("MedAssist triage demo (scripted scores, no network access)");
    let id = service.create_session()?.session_id;
    println!("- Opened {}", id.0);

    println!("\nInitial assessment");
    println!("  Situation: {}", DEMO_SITUATION);
    let view = service
        .assess(&id, demo_profile(), DEMO_SITUATION.to_string())
        .await?;
    render_view(&view);

    let questions = pending_questions(&view);
    if questions.is_empty() {
        return Ok(());
    }
    let answers: Vec<String> = DEMO_ANSWERS.iter().map(|a| a.to_string()).collect();
    let answer = compose_answers(&questions, &answers);

    println!("\nFollow-up round");
    for line in answer.lines() {
        println!("  {}", line);
    }
    let view = service.reassess(&id, answer).await?;
    render_view(&view);

    if skip_booking {
        return Ok(());
    }
    book_if_permitted(&service, &id, &view).await
}

pub(crate) async fn run_assess(args: AssessArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let service = TriageService::new(
        Arc::new(InMemorySessionStore::default()),
        Arc::new(HttpScoringOracle::from_config(&config.oracle)?),
        Arc::new(SimulatedBooker::new(config.booking.latency())),
        DecisionClassifier::default(),
    );

    let (id, view) = drive_assessment(&service, &args, tokio::io::stdin()).await?;
    if args.book {
        book_if_permitted(&service, &id, &view).await?;
    }
    Ok(())
}

/// Run the first round and keep answering follow-up questions from `input`.
///
/// Assessment failures are reported with their user-facing message and end the loop; only
/// session and store failures are returned as errors.
async fn drive_assessment<S, O, B, R>(
    service: &TriageService<S, O, B>,
    args: &AssessArgs,
    input: R,
) -> Result<(SessionId, SessionView), AppError>
where
    S: SessionStore + 'static,
    O: ScoringOracle + 'static,
    B: AppointmentBooker + 'static,
    R: AsyncRead + Unpin,
{
    let id = service.create_session()?.session_id;
    let mut view = match service
        .assess(&id, args.profile(), args.situation.clone())
        .await
    {
        Ok(view) => view,
        Err(TriageServiceError::Session(SessionError::Triage(err))) => {
            println!("  {}", err.user_message());
            return Ok((id.clone(), service.view(&id)?));
        }
        Err(err) => return Err(err.into()),
    };
    let mut lines = BufReader::new(input).lines();

    loop {
        render_view(&view);
        let questions = pending_questions(&view);
        if questions.is_empty() {
            break;
        }

        println!("\nPlease answer the questions above (blank lines skip a question).");
        let mut answers = Vec::with_capacity(questions.len());
        for question in &questions {
            println!("> {}", question);
            match lines.next_line().await? {
                Some(line) => answers.push(line),
                None => return Ok((id, view)),
            }
        }

        match service
            .reassess(&id, compose_answers(&questions, &answers))
            .await
        {
            Ok(next) => view = next,
            Err(TriageServiceError::Session(SessionError::Triage(err))) if err.is_validation() => {
                println!("  {}", err.user_message());
            }
            Err(TriageServiceError::Session(SessionError::Triage(err))) => {
                println!("  {}", err.user_message());
                view = service.view(&id)?;
                break;
            }
            Err(err) => return Err(err.into()),
        }
    }

    Ok((id, view))
}

async fn book_if_permitted<S, O, B>(
    service: &TriageService<S, O, B>,
    id: &SessionId,
    view: &SessionView,
) -> Result<(), AppError>
where
    S: SessionStore + 'static,
    O: ScoringOracle + 'static,
    B: AppointmentBooker + 'static,
{
    let permitted = view
        .latest_decision
        .as_ref()
        .is_some_and(|decision| decision.category.permits_booking());
    if !permitted {
        println!("\nBooking not offered for this decision.");
        return Ok(());
    }

    println!("\nBooking appointment...");
    match service.book_appointment(id).await {
        Ok(confirmation) => println!(
            "  Confirmed {} at {}",
            confirmation.confirmation_id,
            confirmation.booked_at.to_rfc3339()
        ),
        Err(err) => println!("  {}", err.user_message()),
    }
    Ok(())
}

fn pending_questions(view: &SessionView) -> Vec<String> {
    match &view.latest_decision {
        Some(AIDecision {
            category: DecisionCategory::AskForMoreInfo,
            missing_info_questions: Some(questions),
            ..
        }) => questions.clone(),
        _ => Vec::new(),
    }
}

fn render_view(view: &SessionView) {
    if let Some(error) = &view.latest_error {
        println!("  Assessment failed: {}", error);
    }
    if let Some(decision) = &view.latest_decision {
        render_decision(decision);
    }
}

fn render_decision(decision: &AIDecision) {
    println!("  Decision: {}", decision.summary());
    println!("  Reasoning: {}", decision.reasoning);
    println!("  Next step: {}", decision.action_suggestion);
    if let Some(questions) = &decision.missing_info_questions {
        println!("  Questions:");
        for question in questions {
            println!("    - {}", question);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn walkthrough_asks_then_suggests_an_appointment() {
        let service = TriageService::new(
            Arc::new(InMemorySessionStore::default()),
            Arc::new(ScriptedOracle::walkthrough()),
            Arc::new(SimulatedBooker::new(Duration::ZERO)),
            DecisionClassifier::default(),
        );
        let id = service.create_session().expect("session").session_id;

        let first = service
            .assess(&id, demo_profile(), DEMO_SITUATION.to_string())
            .await
            .expect("first round");
        let questions = pending_questions(&first);
        assert_eq!(questions.len(), 2);

        let answers: Vec<String> = DEMO_ANSWERS.iter().map(|a| a.to_string()).collect();
        let second = service
            .reassess(&id, compose_answers(&questions, &answers))
            .await
            .expect("second round");
        assert_eq!(
            second.latest_decision.map(|d| d.category),
            Some(DecisionCategory::SuggestAppointment)
        );
        assert_eq!(second.situation_history.len(), 2);
    }

    fn assess_args(situation: &str) -> AssessArgs {
        AssessArgs {
            situation: situation.to_string(),
            age: None,
            conditions: None,
            allergies: None,
            medications: None,
            book: false,
        }
    }

    fn scripted_service(
        script: Vec<ScoringResult>,
    ) -> TriageService<InMemorySessionStore, ScriptedOracle, SimulatedBooker> {
        TriageService::new(
            Arc::new(InMemorySessionStore::default()),
            Arc::new(ScriptedOracle::new(script)),
            Arc::new(SimulatedBooker::new(Duration::ZERO)),
            DecisionClassifier::default(),
        )
    }

    fn scores(confidence: f64, risk: f64) -> ScoringResult {
        ScoringResult {
            confidence,
            risk,
            is_adversarial: false,
            missing_critical_info: false,
            reasoning: "scripted".to_string(),
            missing_info_questions: Vec::new(),
        }
    }

    #[tokio::test]
    async fn out_of_range_scores_are_reported_without_detail() {
        let service = scripted_service(vec![scores(140.0, 20.0)]);

        let (_, view) = drive_assessment(&service, &assess_args("headache"), &b""[..])
            .await
            .expect("assessment failure is reported, not returned");

        assert!(view.latest_decision.is_none());
        let message = view.latest_error.expect("failure recorded");
        assert!(message.starts_with("Failed to get assessment."));
        assert!(!message.contains("140"));
    }

    #[tokio::test]
    async fn oracle_failure_on_a_follow_up_ends_the_loop() {
        let ask = ScoringResult {
            missing_critical_info: true,
            missing_info_questions: vec!["Since when?".to_string()],
            ..scores(60.0, 40.0)
        };
        let service = scripted_service(vec![ask]);

        let (_, view) = drive_assessment(&service, &assess_args("back pain"), &b"two days\n"[..])
            .await
            .expect("oracle failure is reported, not returned");

        assert!(view.latest_decision.is_none());
        assert!(view.latest_error.is_some());
    }

    #[tokio::test]
    async fn follow_up_answers_are_read_until_a_final_decision() {
        let ask = ScoringResult {
            missing_critical_info: true,
            missing_info_questions: vec!["Since when?".to_string()],
            ..scores(60.0, 40.0)
        };
        let service = scripted_service(vec![ask, scores(72.0, 48.0)]);

        let (_, view) = drive_assessment(&service, &assess_args("back pain"), &b"two days\n"[..])
            .await
            .expect("loop completes");

        assert_eq!(
            view.latest_decision.map(|d| d.category),
            Some(DecisionCategory::SuggestAppointment)
        );
        assert_eq!(view.situation_history.len(), 2);
    }

    #[tokio::test]
    async fn exhausted_script_reports_an_unavailable_oracle() {
        let oracle = ScriptedOracle::new(Vec::new());
        let err = oracle
            .score(&PatientProfile::default(), "headache")
            .await
            .expect_err("nothing scripted");
        assert!(matches!(err, OracleError::Unavailable(_)));
    }

    #[tokio::test]
    async fn demo_runs_to_completion() {
        run_demo(DemoArgs {
            booking_latency_ms: 0,
            skip_booking: false,
        })
        .await
        .expect("demo completes");
    }

    #[test]
    fn assess_args_fill_missing_profile_fields_with_blanks() {
        let args = AssessArgs {
            age: Some("29".to_string()),
            ..assess_args("rash on forearm")
        };

        let profile = args.profile();
        assert_eq!(profile.age, "29");
        assert!(profile.conditions.is_empty());
    }
}
