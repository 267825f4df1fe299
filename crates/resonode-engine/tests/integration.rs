//! Integration tests for resonode-engine.
//!
//! Every test runs on a paused current-thread runtime inside a `LocalSet`, so
//! pass checkpoints advance deterministically.

use std::time::Duration;

use resonode_config::{EngineSettings, get_factory_document};
use resonode_core::{
    AnalyserMode, BuildError, Connection, GraphStructureError, KeyCode, NodeId, NodeKind, Param,
    ParamRef, PrimitiveClass, RecordingBackend,
};
use resonode_engine::{EngineError, LiveUpdate, RebuildState, Session};
use resonode_synth::KeyState;
use tokio::task::LocalSet;

fn session() -> Session<RecordingBackend> {
    Session::new(RecordingBackend::new(48000.0), EngineSettings::default()).unwrap()
}

/// Oscillator(440) → Gain(0.5) → Universal Output(1).
fn osc_gain_out(s: &Session<RecordingBackend>) -> (NodeId, NodeId, NodeId) {
    let osc = s.add_node(NodeKind::Oscillator);
    let gain = s.add_node(NodeKind::Gain);
    let out = s.add_node(NodeKind::UniversalOutput);
    s.set_control(&gain, "gain", 0.5).unwrap();
    s.connect(Connection::new(osc.clone(), "signal", gain.clone(), "signal"))
        .unwrap();
    s.connect(Connection::new(gain.clone(), "signal", out.clone(), "signal"))
        .unwrap();
    (osc, gain, out)
}

fn output_of(s: &Session<RecordingBackend>, node: &NodeId) -> resonode_core::PrimitiveId {
    s.with_live_graph(|live| live.unwrap().built(node).unwrap().output("signal").unwrap())
}

// ============================================================================
// 1. Scheduler behaviour
// ============================================================================

#[tokio::test(start_paused = true)]
async fn burst_of_edits_runs_at_most_one_extra_pass() {
    LocalSet::new()
        .run_until(async {
            let s = session();
            osc_gain_out(&s);
            assert_eq!(s.state(), RebuildState::RebuildPending);

            s.idle().await;
            let report = s.last_report().unwrap();
            assert_eq!(report.pass, 2);

            let summary = report.outcome.unwrap();
            assert_eq!(summary.count(PrimitiveClass::Oscillator), 1);
            assert_eq!(summary.count(PrimitiveClass::Gain), 2);
            assert_eq!(summary.count(PrimitiveClass::Analyser), 2);
            assert_eq!(summary.sources, 1);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn edit_during_pass_coalesces_into_one_follow_up() {
    LocalSet::new()
        .run_until(async {
            let s = session();
            let (osc, gain, _) = osc_gain_out(&s);
            s.idle().await;

            let mut reports = s.subscribe();
            s.set_control(&gain, "gain", 0.25).unwrap();
            tokio::time::sleep(Duration::from_millis(10)).await;
            assert_eq!(s.state(), RebuildState::Rebuilding);

            s.disconnect(&Connection::new(osc, "signal", gain.clone(), "signal"))
                .unwrap();
            s.set_control(&gain, "gain", 0.5).unwrap();
            assert_eq!(s.state(), RebuildState::RebuildPending);

            s.idle().await;
            assert_eq!(reports.try_recv().unwrap().pass, 3);
            let last = reports.try_recv().unwrap();
            assert_eq!(last.pass, 4);
            assert!(reports.try_recv().is_err(), "no third pass");

            let summary = last.outcome.unwrap();
            assert_eq!(summary.count(PrimitiveClass::Oscillator), 0);
            assert_eq!(summary.count(PrimitiveClass::Gain), 2);

            let stage = output_of(&s, &gain);
            let level =
                s.with_backend(|b| b.value_at(ParamRef::new(stage, Param::Gain), 0.0));
            assert_eq!(level, 0.5);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn pass_takes_the_configured_checkpoints() {
    LocalSet::new()
        .run_until(async {
            let s = session();
            let start = tokio::time::Instant::now();
            s.add_node(NodeKind::AudioOutput);
            s.idle().await;
            let pass = EngineSettings::default().reconcile.pass_duration();
            let elapsed = start.elapsed();
            assert!(
                elapsed >= pass && elapsed < pass + Duration::from_millis(5),
                "pass took {elapsed:?}"
            );
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn repeated_passes_build_the_same_primitives() {
    LocalSet::new()
        .run_until(async {
            let s = session();
            osc_gain_out(&s);
            s.idle().await;
            let first = s.last_report().unwrap().outcome.unwrap();

            s.request_rebuild();
            s.idle().await;
            let second = s.last_report().unwrap().outcome.unwrap();
            assert_eq!(first, second);

            // The previous graph is released once replaced.
            let live_oscillators = s.with_backend(|b| b.live_count(PrimitiveClass::Oscillator));
            assert_eq!(live_oscillators, 1);
        })
        .await;
}

// ============================================================================
// 2. Failure keeps the previous graph
// ============================================================================

#[tokio::test(start_paused = true)]
async fn cycle_fails_the_pass_and_keeps_previous_audio() {
    LocalSet::new()
        .run_until(async {
            let s = session();
            let (_, gain, _) = osc_gain_out(&s);
            s.idle().await;
            let before = s.with_live_graph(|live| live.unwrap().primitives().to_vec());
            let osc_handle = before
                .iter()
                .find(|(_, class)| *class == PrimitiveClass::Oscillator)
                .map(|(id, _)| *id)
                .unwrap();

            let loop_gain = s.add_node(NodeKind::Gain);
            s.connect(Connection::new(gain.clone(), "signal", loop_gain.clone(), "signal"))
                .unwrap();
            s.connect(Connection::new(loop_gain.clone(), "signal", gain, "signal"))
                .unwrap();
            s.idle().await;

            let report = s.last_report().unwrap();
            assert!(matches!(
                report.outcome,
                Err(EngineError::Build(BuildError::Structure(
                    GraphStructureError::Cycle(_)
                )))
            ));

            let after = s.with_live_graph(|live| live.unwrap().primitives().to_vec());
            assert_eq!(before, after);
            s.with_backend(|b| {
                for (id, _) in &before {
                    assert!(!b.primitive(*id).unwrap().released);
                }
                let osc = b.primitive(osc_handle).unwrap();
                assert!(osc.started_at.is_some());
                assert!(osc.stopped_at.is_none());
                assert_eq!(b.live_count(PrimitiveClass::Oscillator), 1);
            });

            s.remove_node(&loop_gain).unwrap();
            s.idle().await;
            assert!(s.last_report().unwrap().is_ok());
            s.with_backend(|b| {
                assert!(b.primitive(osc_handle).unwrap().stopped_at.is_some());
                assert_eq!(b.live_count(PrimitiveClass::Oscillator), 1);
            });
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn backend_refusal_fails_only_that_pass() {
    LocalSet::new()
        .run_until(async {
            let s = session();
            let (_, gain, out) = osc_gain_out(&s);
            s.idle().await;

            s.with_backend_mut(|b| b.fail_on(PrimitiveClass::BiquadFilter));
            let filter = s.add_node(NodeKind::BiquadFilter);
            s.disconnect(&Connection::new(gain.clone(), "signal", out.clone(), "signal"))
                .unwrap();
            s.connect(Connection::new(gain, "signal", filter.clone(), "signal"))
                .unwrap();
            s.connect(Connection::new(filter, "signal", out, "signal"))
                .unwrap();
            s.idle().await;

            let report = s.last_report().unwrap();
            assert!(matches!(
                report.outcome,
                Err(EngineError::Build(BuildError::Backend(_)))
            ));
            assert!(s.with_live_graph(|live| live.is_some()));
        })
        .await;
}

// ============================================================================
// 3. Live updates
// ============================================================================

#[tokio::test(start_paused = true)]
async fn live_update_ramps_without_rebuilding() {
    LocalSet::new()
        .run_until(async {
            let s = session();
            let (osc, _, _) = osc_gain_out(&s);
            s.idle().await;
            let pass = s.last_report().unwrap().pass;

            let update = s.set_control_live(&osc, "baseFreq", 880.0).unwrap();
            assert_eq!(update, LiveUpdate::Applied { value: 880.0 });
            assert_eq!(s.state(), RebuildState::Idle);

            let frequency = ParamRef::new(output_of(&s, &osc), Param::Frequency);
            let ramp_end = EngineSettings::default().live.ramp_seconds();
            let value = s.with_backend(|b| b.value_at(frequency, ramp_end));
            assert!((value - 880.0).abs() < 1e-9);

            // The committed value is untouched.
            let committed =
                s.with_graph(|g| g.node(&osc).unwrap().controls().number("baseFreq"));
            assert_eq!(committed, 440.0);

            tokio::time::sleep(Duration::from_secs(1)).await;
            assert_eq!(s.last_report().unwrap().pass, pass);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn live_update_is_clamped_to_the_control_domain() {
    LocalSet::new()
        .run_until(async {
            let s = session();
            let (_, _, out) = osc_gain_out(&s);
            s.idle().await;
            assert_eq!(
                s.set_control_live(&out, "gain", 3.0).unwrap(),
                LiveUpdate::Applied { value: 1.0 }
            );
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn live_update_is_bounded_by_the_built_primitive() {
    LocalSet::new()
        .run_until(async {
            let s = session();
            let osc = s.add_node(NodeKind::Oscillator);
            let delay = s.add_node(NodeKind::Delay);
            let out = s.add_node(NodeKind::AudioOutput);
            s.set_control(&delay, "maxDelay", 1.0).unwrap();
            s.connect(Connection::new(osc.clone(), "signal", delay.clone(), "signal"))
                .unwrap();
            s.connect(Connection::new(delay.clone(), "signal", out, "signal"))
                .unwrap();
            s.idle().await;

            assert_eq!(
                s.set_control_live(&delay, "delay", 10.0).unwrap(),
                LiveUpdate::Applied { value: 1.0 }
            );
            assert_eq!(
                s.set_control_live(&osc, "baseFreq", -1e9).unwrap(),
                LiveUpdate::Applied { value: 0.0 }
            );
            assert_eq!(
                s.set_control_live(&osc, "baseFreq", 1e9).unwrap(),
                LiveUpdate::Applied { value: 24000.0 }
            );
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn live_update_rejects_enum_unknown_and_derived_controls() {
    LocalSet::new()
        .run_until(async {
            let s = session();
            let (osc, _, _) = osc_gain_out(&s);
            let delay = s.add_node(NodeKind::Delay);
            s.idle().await;

            for (node, key) in [(&osc, "waveform"), (&osc, "loudness"), (&delay, "maxDelay")] {
                let err = s.set_control_live(node, key, 1.0).unwrap_err();
                assert!(matches!(err, EngineError::Live(_)), "{key}: {err:?}");
            }
            assert!(s.set_control_live(&osc, "baseFreq", f64::NAN).is_err());
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn live_update_on_connected_socket_is_bypassed() {
    LocalSet::new()
        .run_until(async {
            let s = session();
            let (osc, _, _) = osc_gain_out(&s);
            let constant = s.add_node(NodeKind::Constant);
            s.connect(Connection::new(constant, "value", osc.clone(), "baseFrequency"))
                .unwrap();
            s.idle().await;

            assert_eq!(
                s.set_control_live(&osc, "baseFreq", 100.0).unwrap(),
                LiveUpdate::Bypassed
            );
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn live_update_on_unreachable_node_is_not_built() {
    LocalSet::new()
        .run_until(async {
            let s = session();
            osc_gain_out(&s);
            let loose = s.add_node(NodeKind::Gain);
            s.idle().await;

            assert_eq!(
                s.set_control_live(&loose, "gain", 0.3).unwrap(),
                LiveUpdate::NotBuilt
            );
        })
        .await;
}

// ============================================================================
// 4. Keyboard, documents, visualizers
// ============================================================================

#[tokio::test(start_paused = true)]
async fn keyboard_plays_installed_voices_and_resets_on_rebuild() {
    LocalSet::new()
        .run_until(async {
            let s = session();
            let report = s.import_document(&get_factory_document("Keyboard Synth").unwrap());
            assert!(report.is_clean());
            s.idle().await;
            assert_eq!(s.last_report().unwrap().outcome.unwrap().voices, 25);

            let z = KeyCode::parse("KeyZ").unwrap();
            assert!(s.key_down("KeyZ", false));
            assert_eq!(s.key_state(z), KeyState::Held);

            // Shift alone turns sustain on; releasing it lets deferred keys go.
            assert!(!s.key_down("ShiftLeft", true));
            assert!(s.is_sustaining());
            s.key_up("KeyZ", true);
            assert_eq!(s.key_state(z), KeyState::SustainDeferred);
            s.key_up("ShiftLeft", false);
            assert!(!s.is_sustaining());
            assert_eq!(s.key_state(z), KeyState::Idle);

            assert!(s.key_down("KeyZ", false));
            s.request_rebuild();
            s.idle().await;
            assert_eq!(s.key_state(z), KeyState::Idle);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn failed_pass_keeps_keyboard_voices() {
    LocalSet::new()
        .run_until(async {
            let s = session();
            s.import_document(&get_factory_document("keyboard_synth").unwrap());
            s.idle().await;

            let q = KeyCode::parse("KeyQ").unwrap();
            assert!(s.key_down("KeyQ", false));

            let a = s.add_node(NodeKind::Gain);
            let b = s.add_node(NodeKind::Gain);
            let out = s.add_node(NodeKind::AudioOutput);
            s.connect(Connection::new(a.clone(), "signal", b.clone(), "signal"))
                .unwrap();
            s.connect(Connection::new(b, "signal", a.clone(), "signal"))
                .unwrap();
            s.connect(Connection::new(a, "signal", out, "signal")).unwrap();
            s.idle().await;
            assert!(!s.last_report().unwrap().is_ok());

            // The key held across the failed pass still releases its voices.
            assert_eq!(s.key_state(q), KeyState::Held);
            let (voice, profile) = s.voices(q)[0];
            s.with_backend_mut(|b| b.advance_to(0.5));
            s.key_up("KeyQ", false);
            assert_eq!(s.key_state(q), KeyState::Idle);
            let silent_at = 0.5 + profile.release_length + 0.01;
            assert_eq!(s.with_backend(|b| b.value_at(voice.gain, silent_at)), 0.0);

            assert!(s.key_down("KeyQ", false), "previous voices still installed");
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn import_skips_dangling_connection_and_builds_the_rest() {
    LocalSet::new()
        .run_until(async {
            let s = session();
            let mut doc = get_factory_document("basic_tone").unwrap();
            doc.connections.push(resonode_core::ConnectionRecord {
                source: NodeId::new("n404"),
                source_output: "signal".into(),
                target: NodeId::new("n2"),
                target_input: "signal".into(),
            });

            let report = s.import_document(&doc);
            assert_eq!(report.imported_nodes, 2);
            assert_eq!(report.imported_connections, 1);
            assert_eq!(report.skipped.len(), 1);

            s.idle().await;
            let summary = s.last_report().unwrap().outcome.unwrap();
            assert_eq!(summary.count(PrimitiveClass::Oscillator), 1);

            let exported = s.export_document();
            assert_eq!(exported.nodes.len(), 2);
            assert_eq!(exported.connections.len(), 1);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn visualizers_expose_output_analysers() {
    LocalSet::new()
        .run_until(async {
            let s = session();
            let (_, _, out) = osc_gain_out(&s);
            assert!(s.visualizers().is_empty());
            s.idle().await;

            let views = s.visualizers();
            assert_eq!(views.len(), 2);
            assert!(views.iter().all(|v| v.node == out));
            assert!(views.iter().any(|v| v.mode == AnalyserMode::Time));
            assert!(views.iter().any(|v| v.mode == AnalyserMode::Frequency));
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn playback_toggle_goes_through_a_rebuild() {
    LocalSet::new()
        .run_until(async {
            let s = session();
            osc_gain_out(&s);
            s.idle().await;
            let pass = s.last_report().unwrap().pass;

            s.set_playing(false);
            assert!(!s.is_playing());
            assert!(s.is_busy());
            s.idle().await;
            assert_eq!(s.last_report().unwrap().pass, pass + 1);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn generated_code_uses_session_settings() {
    LocalSet::new()
        .run_until(async {
            let mut settings = EngineSettings::default();
            settings.output.master_gain = 0.25;
            let s = Session::new(RecordingBackend::new(48000.0), settings).unwrap();
            osc_gain_out(&s);

            let code = s.generate_code().unwrap();
            assert!(code.contains("0.25"));
            assert!(code.contains("export { ctx, master, sources };"));
        })
        .await;
}
