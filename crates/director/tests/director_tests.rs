use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use aurora_core::content::{courage, temptation, wisdom};
use aurora_core::{CodeRejection, LifecycleState, PhaseId, UnlockCodeTable};
use director::phases::LetterPhase;
use director::{
    BoardView, Color, Direction, DirectorConfig, DirectorError, GateOutcome, GatePolicy,
    Interaction, PhaseContext, PhaseDirector, PhaseError, PhaseRegistry, PhaseResult, PhaseScript,
    Placement, PlayerInput, Recorder, Shape, SurfaceCall,
};
use events::{Event, EventBus, EventEnvelope};
use progress::{MemoryStore, ProgressGate};
use tokio::sync::broadcast;

struct Harness {
    director: PhaseDirector,
    recorder: Recorder,
    progress: Arc<ProgressGate>,
    events: broadcast::Receiver<EventEnvelope>,
}

fn setup(registry: PhaseRegistry) -> Harness {
    let recorder = Recorder::new();
    let progress = Arc::new(ProgressGate::new(
        Arc::new(MemoryStore::new()),
        UnlockCodeTable::standard(),
    ));
    let bus = EventBus::with_capacity(4096);
    let events = bus.subscribe();
    let director = PhaseDirector::new(
        registry,
        recorder.surfaces(),
        Arc::clone(&progress),
        bus,
        DirectorConfig::default(),
    );

    Harness {
        director,
        recorder,
        progress,
        events,
    }
}

fn drain(events: &mut broadcast::Receiver<EventEnvelope>) -> Vec<EventEnvelope> {
    let mut seen = Vec::new();
    while let Ok(envelope) = events.try_recv() {
        seen.push(envelope);
    }
    seen
}

fn sequence_of(events: &[EventEnvelope], wanted: &Event) -> Option<u64> {
    events
        .iter()
        .find(|envelope| &envelope.event == wanted)
        .map(|envelope| envelope.sequence)
}

/// Opens one choice gate and records how it resolved.
struct GateScript {
    policy: GatePolicy,
    outcomes: Arc<Mutex<Vec<GateOutcome>>>,
}

#[async_trait]
impl PhaseScript for GateScript {
    fn phase(&self) -> PhaseId {
        PhaseId::COURAGE
    }

    async fn initialize(&mut self, ctx: &PhaseContext) -> PhaseResult<()> {
        let outcome = ctx
            .gate(Interaction::choice(["left", "right"]), self.policy)
            .await?;
        self.outcomes.lock().unwrap().push(outcome);
        Ok(())
    }
}

fn gate_registry(policy: GatePolicy) -> (PhaseRegistry, Arc<Mutex<Vec<GateOutcome>>>) {
    let outcomes = Arc::new(Mutex::new(Vec::new()));
    let shared = Arc::clone(&outcomes);
    let registry = PhaseRegistry::new().with(PhaseId::COURAGE, move || {
        Box::new(GateScript {
            policy,
            outcomes: Arc::clone(&shared),
        })
    });
    (registry, outcomes)
}

/// Schedules a late effect and then idles.
struct TimerScript;

#[async_trait]
impl PhaseScript for TimerScript {
    fn phase(&self) -> PhaseId {
        PhaseId::COURAGE
    }

    async fn initialize(&mut self, ctx: &PhaseContext) -> PhaseResult<()> {
        ctx.after(Duration::from_secs(10), |ctx| ctx.show_text("late", None));
        ctx.pause(60_000).await?;
        ctx.show_text("after pause", None);
        Ok(())
    }
}

/// Dims the screen, then fails.
struct FailingScript;

#[async_trait]
impl PhaseScript for FailingScript {
    fn phase(&self) -> PhaseId {
        PhaseId::COURAGE
    }

    async fn initialize(&mut self, ctx: &PhaseContext) -> PhaseResult<()> {
        ctx.show_text("the lights go out", None);
        ctx.fade_overlay(0.8, Duration::from_millis(200)).await?;
        Err(PhaseError::script("lantern missing"))
    }
}

fn last_board(recorder: &Recorder) -> Option<BoardView> {
    recorder.calls().iter().rev().find_map(|call| match call {
        SurfaceCall::Board(board) => Some(*board),
        _ => None,
    })
}

mod ordering {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_teardown_happens_before_next_initialize() {
        let mut harness = setup(PhaseRegistry::standard());

        harness.director.request_phase(PhaseId::LETTER).await.unwrap();
        assert!(
            harness
                .recorder
                .wait_until(Duration::from_secs(30), |r| r.current_text().is_some())
                .await
        );

        harness.director.request_phase(PhaseId::COURAGE).await.unwrap();
        let first_model = courage::OBJECTS[0].model;
        assert!(
            harness
                .recorder
                .wait_until(Duration::from_secs(30), |r| {
                    r.position(|call| {
                        matches!(call, SurfaceCall::ModelAdded { asset, .. } if asset == first_model)
                    })
                    .is_some()
                })
                .await
        );

        let events = drain(&mut harness.events);
        let torn_down = sequence_of(&events, &Event::PhaseTornDown { phase: 0 }).unwrap();
        let initializing = sequence_of(&events, &Event::PhaseInitializing { phase: 1 }).unwrap();
        assert!(torn_down < initializing);

        let recorder = &harness.recorder;
        let cleared = recorder
            .position(|call| matches!(call, SurfaceCall::Cleared))
            .unwrap();
        let title = recorder
            .position(|call| matches!(call, SurfaceCall::PhaseTitle(PhaseId::COURAGE)))
            .unwrap();
        let model = recorder
            .position(|call| {
                matches!(call, SurfaceCall::ModelAdded { asset, .. } if asset == first_model)
            })
            .unwrap();
        assert!(cleared < title);
        assert!(title < model);
        assert_eq!(harness.director.current_phase_id(), Some(PhaseId::COURAGE));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequence_numbers_increase() {
        let mut harness = setup(PhaseRegistry::standard());
        harness.director.request_phase(PhaseId::LETTER).await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;

        let events = drain(&mut harness.events);
        assert!(events.len() >= 3);
        assert!(events
            .windows(2)
            .all(|pair| pair[0].sequence < pair[1].sequence));
        assert_eq!(
            events[0].event,
            Event::PhaseRequested {
                from: None,
                to: 0,
                reason: "manual".to_string()
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_unimplemented_phase_leaves_live_phase_alone() {
        let registry = PhaseRegistry::new().with(PhaseId::LETTER, || Box::new(LetterPhase::new()));
        let mut harness = setup(registry);

        harness.director.request_phase(PhaseId::LETTER).await.unwrap();
        assert!(
            harness
                .recorder
                .wait_until(Duration::from_secs(30), |r| r.current_text().is_some())
                .await
        );
        let calls_before = harness
            .recorder
            .position(|call| matches!(call, SurfaceCall::Cleared));

        let result = harness.director.request_phase(PhaseId::GRACE).await;
        assert!(matches!(
            result,
            Err(DirectorError::PhaseNotImplemented(PhaseId::GRACE))
        ));
        assert_eq!(harness.director.current_phase_id(), Some(PhaseId::LETTER));
        assert_eq!(
            harness.director.live_state(),
            Some(LifecycleState::Running)
        );
        assert_eq!(
            harness
                .recorder
                .position(|call| matches!(call, SurfaceCall::Cleared)),
            calls_before
        );

        let events = drain(&mut harness.events);
        assert!(sequence_of(&events, &Event::PhaseNotImplemented { phase: 8 }).is_some());
        assert!(sequence_of(&events, &Event::PhaseTornDown { phase: 0 }).is_none());
    }
}

mod teardown {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_no_side_effects_after_teardown_mid_narration() {
        let mut harness = setup(PhaseRegistry::standard());

        harness.director.request_phase(PhaseId::LETTER).await.unwrap();
        assert!(
            harness
                .recorder
                .wait_until(Duration::from_secs(30), |r| r.current_text().is_some())
                .await
        );
        let ctx = Arc::clone(harness.director.live_instance().unwrap().context());

        harness.director.stop();
        assert_eq!(ctx.state(), LifecycleState::Destroyed);
        assert!(harness.recorder.live_objects().is_empty());
        assert_eq!(harness.recorder.current_text(), None);

        let frozen = harness.recorder.call_count();
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(harness.recorder.call_count(), frozen);
        assert_eq!(ctx.ledger().pending_timers(), 0);
        assert_eq!(ctx.ledger().pending_animations(), 0);

        let events = drain(&mut harness.events);
        assert!(sequence_of(&events, &Event::PhaseTornDown { phase: 0 }).is_some());
        assert!(sequence_of(&events, &Event::PhaseCompleted { phase: 0 }).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_timer_is_cancelled() {
        let registry = PhaseRegistry::new().with(PhaseId::COURAGE, || Box::new(TimerScript));
        let mut harness = setup(registry);

        harness.director.request_phase(PhaseId::COURAGE).await.unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        let ctx = Arc::clone(harness.director.live_instance().unwrap().context());
        // the scheduled effect plus the pause
        assert_eq!(ctx.ledger().pending_timers(), 2);

        harness.director.stop();
        tokio::time::sleep(Duration::from_secs(90)).await;

        let texts = harness.recorder.texts();
        assert!(!texts.contains(&"late".to_string()));
        assert!(!texts.contains(&"after pause".to_string()));
        assert_eq!(ctx.ledger().pending_timers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_beats_racing_teardown_leave_nothing_behind() {
        let registry = PhaseRegistry::new().with(PhaseId::COURAGE, || Box::new(TimerScript));
        let mut harness = setup(registry);

        harness.director.request_phase(PhaseId::COURAGE).await.unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        let ctx = Arc::clone(harness.director.live_instance().unwrap().context());

        let workers: Vec<_> = (0..4)
            .map(|_| {
                let ctx = Arc::clone(&ctx);
                std::thread::spawn(move || {
                    while !ctx.is_destroyed() {
                        ctx.placeholder(Shape::Box, Color::WHITE, Placement::default());
                        ctx.show_text("still here", None);
                    }
                })
            })
            .collect();
        std::thread::sleep(Duration::from_millis(5));

        harness.director.stop();
        for worker in workers {
            worker.join().unwrap();
        }

        assert!(harness.recorder.live_objects().is_empty());
        assert_eq!(harness.recorder.current_text(), None);

        let overlay = harness.recorder.overlay_opacity();
        let frozen = harness.recorder.call_count();
        ctx.set_overlay(0.6);
        ctx.show_text("too late", None);
        assert_eq!(harness.recorder.overlay_opacity(), overlay);
        assert_eq!(harness.recorder.call_count(), frozen);
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_closes_open_gate() {
        let (registry, outcomes) = gate_registry(GatePolicy::give_up());
        let mut harness = setup(registry);

        harness.director.request_phase(PhaseId::COURAGE).await.unwrap();
        assert!(harness
            .recorder
            .wait_for_gate(0, Duration::from_secs(5))
            .await
            .is_some());

        harness.director.stop();
        assert!(harness.recorder.open_gates().is_empty());
        assert!(!harness.director.send_input(PlayerInput::Select(0)));

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(outcomes.lock().unwrap().is_empty());
    }
}

mod failure {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_failed_script_clears_the_screen_and_director_carries_on() {
        let registry = PhaseRegistry::new()
            .with(PhaseId::LETTER, || Box::new(LetterPhase::new()))
            .with(PhaseId::COURAGE, || Box::new(FailingScript));
        let mut harness = setup(registry);
        let recorder = harness.recorder.clone();
        let handle = harness.director.handle();
        let runner = tokio::spawn(harness.director.run());

        handle.request_phase(PhaseId::COURAGE).await.unwrap();
        let cleared = recorder
            .wait_until(Duration::from_secs(10), |r| {
                r.texts().contains(&"the lights go out".to_string())
                    && r.current_text().is_none()
                    && r.overlay_opacity() == 0.0
            })
            .await;
        assert!(cleared);

        let events = drain(&mut harness.events);
        assert!(sequence_of(
            &events,
            &Event::PhaseFailed {
                phase: 1,
                message: "Script error: lantern missing".to_string()
            }
        )
        .is_some());
        assert!(sequence_of(&events, &Event::PhaseCompleted { phase: 1 }).is_none());

        handle.request_phase(PhaseId::LETTER).await.unwrap();
        assert_eq!(handle.current_phase(), Some(PhaseId::LETTER));
        assert!(
            recorder
                .wait_until(Duration::from_secs(30), |r| r.current_text().is_some())
                .await
        );

        handle.shutdown().unwrap();
        runner.await.unwrap();
    }
}

mod gates {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_gate_times_out() {
        let (registry, outcomes) = gate_registry(GatePolicy::timeout(Duration::from_secs(5)));
        let mut harness = setup(registry);

        harness.director.request_phase(PhaseId::COURAGE).await.unwrap();
        tokio::time::sleep(Duration::from_secs(6)).await;

        assert_eq!(*outcomes.lock().unwrap(), vec![GateOutcome::TimedOut]);
        assert!(harness.recorder.open_gates().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_gate_give_up() {
        let (registry, outcomes) = gate_registry(GatePolicy::give_up());
        let mut harness = setup(registry);

        harness.director.request_phase(PhaseId::COURAGE).await.unwrap();
        harness
            .recorder
            .wait_for_gate(0, Duration::from_secs(5))
            .await
            .unwrap();
        assert!(harness.director.send_input(PlayerInput::GiveUp));
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(*outcomes.lock().unwrap(), vec![GateOutcome::GaveUp]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gate_ignores_inputs_that_do_not_fit() {
        let (registry, outcomes) = gate_registry(GatePolicy::give_up());
        let mut harness = setup(registry);

        harness.director.request_phase(PhaseId::COURAGE).await.unwrap();
        harness
            .recorder
            .wait_for_gate(0, Duration::from_secs(5))
            .await
            .unwrap();

        harness.director.send_input(PlayerInput::Select(7));
        harness.director.send_input(PlayerInput::Confirm);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(outcomes.lock().unwrap().is_empty());
        assert_eq!(harness.recorder.open_gates().len(), 1);

        harness.director.send_input(PlayerInput::Select(1));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(
            *outcomes.lock().unwrap(),
            vec![GateOutcome::Responded(PlayerInput::Select(1))]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_gate_without_exit_offers_give_up() {
        let no_exit = GatePolicy {
            timeout: None,
            allow_give_up: false,
        };
        let (registry, outcomes) = gate_registry(no_exit);
        let mut harness = setup(registry);

        harness.director.request_phase(PhaseId::COURAGE).await.unwrap();
        harness
            .recorder
            .wait_for_gate(0, Duration::from_secs(5))
            .await
            .unwrap();
        harness.director.send_input(PlayerInput::GiveUp);
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(*outcomes.lock().unwrap(), vec![GateOutcome::GaveUp]);
    }
}

mod journey {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_card_unlocks_and_completes_courage() {
        let harness = setup(PhaseRegistry::standard());
        let recorder = harness.recorder.clone();
        let progress = Arc::clone(&harness.progress);
        let handle = harness.director.handle();
        let runner = tokio::spawn(harness.director.run());

        let validation = handle.submit_code("aurora1").await.unwrap();
        assert!(validation.valid);
        assert_eq!(validation.phase, Some(PhaseId::COURAGE));
        assert!(progress.is_unlocked(PhaseId::COURAGE));

        for found in 0..courage::OBJECTS.len() {
            let (_, gate) = recorder
                .wait_for_gate(found, Duration::from_secs(120))
                .await
                .expect("hunt gate");
            let Interaction::ObjectHunt { targets } = gate else {
                panic!("expected an object hunt, got {gate:?}");
            };
            handle.send_input(PlayerInput::Click(targets[found])).unwrap();
        }

        let done = {
            let progress = Arc::clone(&progress);
            recorder
                .wait_until(Duration::from_secs(300), move |_| {
                    progress.is_completed(PhaseId::COURAGE)
                })
                .await
        };
        assert!(done);

        let record = progress.record(PhaseId::COURAGE).unwrap();
        assert_eq!(record.payload["objectsFound"].as_array().unwrap().len(), 5);
        assert_eq!(record.payload["gaveUp"], serde_json::json!(false));
        assert!(recorder.toasts().iter().all(|t| t != courage::ALREADY_FOUND));
        assert!(
            recorder
                .wait_until(Duration::from_secs(5), |r| {
                    r.position(|call| matches!(call, SurfaceCall::CodePrompt(_)))
                        .is_some()
                })
                .await
        );

        handle.shutdown().unwrap();
        runner.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_card_twice_is_rejected() {
        let mut harness = setup(PhaseRegistry::standard());
        let recorder = harness.recorder.clone();
        let handle = harness.director.handle();
        let runner = tokio::spawn(harness.director.run());

        let first = handle.submit_code("AURORA1").await.unwrap();
        let second = handle.submit_code(" aurora1 ").await.unwrap();

        assert!(first.valid);
        assert!(!second.valid);
        assert_eq!(second.rejection, Some(CodeRejection::AlreadyUsed));
        assert!(recorder
            .toasts()
            .contains(&CodeRejection::AlreadyUsed.message().to_string()));
        assert_eq!(handle.current_phase(), Some(PhaseId::COURAGE));

        let events = drain(&mut harness.events);
        let entries = events
            .iter()
            .filter(|e| matches!(e.event, Event::PhaseRequested { to: 1, .. }))
            .count();
        assert_eq!(entries, 1);
        assert!(sequence_of(
            &events,
            &Event::CodeRejected {
                reason: "already_used".to_string()
            }
        )
        .is_some());

        handle.shutdown().unwrap();
        runner.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_card_changes_nothing() {
        let harness = setup(PhaseRegistry::standard());
        let progress = Arc::clone(&harness.progress);
        let handle = harness.director.handle();
        let runner = tokio::spawn(harness.director.run());

        let validation = handle.submit_code("LUMOS").await.unwrap();
        assert!(!validation.valid);
        assert_eq!(validation.rejection, Some(CodeRejection::Unknown));
        assert_eq!(handle.current_phase(), None);
        assert!(progress.snapshot().cards_used.is_empty());

        handle.shutdown().unwrap();
        runner.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_returns_to_the_letter() {
        let harness = setup(PhaseRegistry::standard());
        let progress = Arc::clone(&harness.progress);
        let handle = harness.director.handle();
        let runner = tokio::spawn(harness.director.run());

        handle.submit_code("AURORA2").await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(handle.current_phase(), Some(PhaseId::WISDOM));

        handle.reset().await.unwrap();
        assert_eq!(handle.current_phase(), Some(PhaseId::LETTER));
        assert!(!progress.is_unlocked(PhaseId::WISDOM));
        assert!(progress.snapshot().cards_used.is_empty());

        handle.shutdown().unwrap();
        runner.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_staying_in_the_dark_advances_to_grace() {
        let harness = setup(PhaseRegistry::standard());
        let recorder = harness.recorder.clone();
        let progress = Arc::clone(&harness.progress);
        let handle = harness.director.handle();
        let runner = tokio::spawn(harness.director.run());

        handle.request_phase(PhaseId::DARK_NIGHT).await.unwrap();
        let (_, relics) = recorder
            .wait_for_gate(0, Duration::from_secs(30))
            .await
            .expect("relic gate");
        assert!(matches!(relics, Interaction::Choice { .. }));
        handle.send_input(PlayerInput::GiveUp).unwrap();

        let (_, stay) = recorder
            .wait_for_gate(1, Duration::from_secs(30))
            .await
            .expect("stay gate");
        assert!(matches!(stay, Interaction::Confirm { .. }));
        handle.send_input(PlayerInput::Confirm).unwrap();

        let arrived = {
            let handle = handle.clone();
            recorder
                .wait_until(Duration::from_secs(120), move |_| {
                    handle.current_phase() == Some(PhaseId::GRACE)
                })
                .await
        };
        assert!(arrived);
        assert!(progress.is_completed(PhaseId::DARK_NIGHT));
        assert!(progress.is_unlocked(PhaseId::GRACE));
        let record = progress.record(PhaseId::DARK_NIGHT).unwrap();
        assert_eq!(record.payload["stayed"], serde_json::json!(true));

        handle.shutdown().unwrap();
        runner.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_wrong_riddle_answer_asks_again() {
        let harness = setup(PhaseRegistry::standard());
        let recorder = harness.recorder.clone();
        let progress = Arc::clone(&harness.progress);
        let handle = harness.director.handle();
        let runner = tokio::spawn(harness.director.run());

        handle.request_phase(PhaseId::WISDOM).await.unwrap();
        let riddle = &wisdom::RIDDLES[0];
        let (first, asked) = recorder
            .wait_for_gate(0, Duration::from_secs(120))
            .await
            .expect("riddle gate");
        assert_eq!(recorder.current_text().as_deref(), Some(riddle.question));

        let wrong = (riddle.answer + 1) % riddle.options.len();
        handle.send_input(PlayerInput::Select(wrong)).unwrap();

        let (second, asked_again) = recorder
            .wait_for_gate(1, Duration::from_secs(30))
            .await
            .expect("riddle asked again");
        assert_ne!(first, second);
        assert_eq!(asked_again, asked);
        assert_eq!(recorder.current_text().as_deref(), Some(riddle.question));
        assert!(recorder.toasts().contains(&wisdom::WRONG_ANSWER.to_string()));
        assert_eq!(recorder.gates_opened(), 2);
        assert!(!progress.is_completed(PhaseId::WISDOM));

        handle.shutdown().unwrap();
        runner.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_voices_speak_on_entry_and_a_wrong_choice_costs_ground() {
        let harness = setup(PhaseRegistry::standard());
        let recorder = harness.recorder.clone();
        let handle = harness.director.handle();
        let runner = tokio::spawn(harness.director.run());

        handle.request_phase(PhaseId::TEMPTATION).await.unwrap();

        // The first temptation comes before any move.
        let (_, first) = recorder
            .wait_for_gate(0, Duration::from_secs(60))
            .await
            .expect("first voice choice");
        assert!(matches!(first, Interaction::Choice { .. }));
        let voices = &temptation::TEMPTATIONS[0];
        let texts = recorder.texts();
        let voice_at = texts.iter().position(|t| t == voices.voice).unwrap();
        let truth_at = texts.iter().position(|t| t == voices.truth).unwrap();
        assert!(voice_at < truth_at);
        handle.send_input(PlayerInput::Select(1)).unwrap();

        let mut seen = 1;
        for _ in 0..temptation::MOVES_PER_TEMPTATION {
            let (_, gate) = recorder
                .wait_for_gate(seen, Duration::from_secs(30))
                .await
                .expect("maze gate");
            assert_eq!(gate, Interaction::Directional);
            handle
                .send_input(PlayerInput::Move(Direction::Right))
                .unwrap();
            seen += 1;
        }

        let (_, second) = recorder
            .wait_for_gate(seen, Duration::from_secs(30))
            .await
            .expect("second voice choice");
        assert!(matches!(second, Interaction::Choice { .. }));
        assert_eq!(last_board(&recorder).unwrap().player, (3, 0));

        // The second voice is the wise one this time; the first leads astray.
        assert!(temptation::TEMPTATIONS[1].leads_to_progress);
        handle.send_input(PlayerInput::Select(1)).unwrap();
        let astray = recorder
            .wait_until(Duration::from_secs(5), |r| {
                r.toasts().contains(&temptation::WENT_ASTRAY.to_string())
            })
            .await;
        assert!(astray);
        assert_eq!(last_board(&recorder).unwrap().player, (2, 0));

        handle.shutdown().unwrap();
        runner.await.unwrap();
    }
}
