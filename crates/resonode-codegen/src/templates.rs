//! One deterministic statement block per node kind.

use resonode_core::kind::processors::transpose_ratio;
use resonode_core::kind::sources::note_to_frequency;
use resonode_core::voice::note_map;
use resonode_core::{Combine, Controls, Graph, Node, NodeKind, NoiseType, VoiceProfile};

use crate::runtime::noise_function;
use crate::script::{Script, num, string};

/// Where wires into one input socket land.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Sink {
    /// `upstream.connect(target)`
    Input(String),
    /// `upstream.connect(path)` on an `AudioParam`.
    Param {
        /// Expression of the `AudioParam`.
        path: String,
        /// Policy of the socket feeding it.
        combine: Combine,
    },
    /// The same parameter on every primitive in a JS array.
    EachParam {
        /// Array variable.
        list: String,
        /// `AudioParam` attribute on each element.
        param: &'static str,
    },
    /// Display-only sink; wires into it emit nothing.
    Dropped,
}

/// Handles a node block exposes to the wiring pass.
#[derive(Debug, Default)]
pub(crate) struct Block {
    pub(crate) outputs: Vec<(&'static str, String)>,
    pub(crate) inputs: Vec<(&'static str, Sink)>,
}

impl Block {
    fn output(mut self, socket: &'static str, handle: String) -> Self {
        self.outputs.push((socket, handle));
        self
    }

    fn input(mut self, socket: &'static str, sink: Sink) -> Self {
        self.inputs.push((socket, sink));
        self
    }

    pub(crate) fn output_handle(&self, socket: &str) -> Option<&str> {
        self.outputs
            .iter()
            .find(|(s, _)| *s == socket)
            .map(|(_, h)| h.as_str())
    }

    pub(crate) fn sink(&self, socket: &str) -> Option<&Sink> {
        self.inputs.iter().find(|(s, _)| *s == socket).map(|(_, k)| k)
    }
}

fn param(path: String, combine: Combine) -> Sink {
    Sink::Param { path, combine }
}

fn profile_literal(profile: &VoiceProfile) -> String {
    format!(
        "{{ attack: {}, attackLength: {}, decay: {}, decayLength: {}, sustain: {}, sustainLength: {}, releaseLength: {} }}",
        num(profile.attack),
        num(profile.attack_length),
        num(profile.decay),
        num(profile.decay_length),
        num(profile.sustain),
        num(profile.sustain_length),
        num(profile.release_length),
    )
}

/// The pitch map as a JS array literal of `[key, frequency]` pairs.
pub(crate) fn note_map_literal() -> String {
    let pairs: Vec<String> = note_map()
        .map(|(key, freq)| format!("[{}, {}]", string(key.as_str()), num(freq)))
        .collect();
    format!("const NOTE_MAP = [{}];", pairs.join(", "))
}

/// Emits the statements for the node at `index` and returns its wiring handles.
///
/// Variables are named `n<position>_<role>`, counting nodes from 1.
pub(crate) fn emit_node(
    script: &mut Script,
    index: usize,
    node: &Node,
    graph: &Graph,
    noise_seconds: f64,
) -> Block {
    let v = format!("n{}", index + 1);
    let controls = node.controls();
    script.line(format!("// {} {}", node.kind(), string(node.id().as_str())));

    let block = match node.kind() {
        NodeKind::Constant => {
            let src = format!("{v}_src");
            script.line(format!("const {src} = ctx.createConstantSource();"));
            script.line(format!("{src}.offset.value = {};", num(controls.number("value"))));
            script.line(format!("sources.push({src});"));
            Block::default().output("value", src)
        }
        NodeKind::Oscillator => {
            let osc = format!("{v}_osc");
            script.line(format!("const {osc} = ctx.createOscillator();"));
            script.line(format!("{osc}.type = {};", string(controls.choice("waveform"))));
            script.line(format!("sources.push({osc});"));
            Block::default()
                .output("signal", osc.clone())
                .input("baseFrequency", param(format!("{osc}.frequency"), Combine::Override))
                .input("frequency", param(format!("{osc}.frequency"), Combine::Modulate))
        }
        NodeKind::Noise => {
            let noise = NoiseType::parse(controls.choice("noiseType")).unwrap_or_default();
            let buffer = format!("{v}_buffer");
            let src = format!("{v}_src");
            script.line(format!(
                "const {buffer} = ctx.createBuffer(1, Math.round({} * ctx.sampleRate), ctx.sampleRate);",
                num(noise_seconds)
            ));
            script.line(format!(
                "{}({buffer}.getChannelData(0));",
                noise_function(noise)
            ));
            script.line(format!("const {src} = ctx.createBufferSource();"));
            script.line(format!("{src}.buffer = {buffer};"));
            script.line(format!("{src}.loop = true;"));
            script.line(format!("sources.push({src});"));
            Block::default().output("signal", src)
        }
        NodeKind::NoteFrequency => {
            let src = format!("{v}_src");
            let freq = note_to_frequency(controls.number("note"), controls.number("octave"));
            script.line(format!("const {src} = ctx.createConstantSource();"));
            script.line(format!("{src}.offset.value = {};", num(freq)));
            script.line(format!("sources.push({src});"));
            Block::default().output("value", src)
        }
        NodeKind::Gain => {
            let gain = format!("{v}_gain");
            script.line(format!("const {gain} = ctx.createGain();"));
            Block::default()
                .output("signal", gain.clone())
                .input("signal", Sink::Input(gain.clone()))
                .input("gain", param(format!("{gain}.gain"), Combine::Additive))
        }
        NodeKind::BiquadFilter => {
            let filter = format!("{v}_filter");
            script.line(format!("const {filter} = ctx.createBiquadFilter();"));
            script.line(format!(
                "{filter}.type = {};",
                string(controls.choice("filterType"))
            ));
            Block::default()
                .output("signal", filter.clone())
                .input("signal", Sink::Input(filter.clone()))
                .input("frequency", param(format!("{filter}.frequency"), Combine::Additive))
                .input("q", param(format!("{filter}.Q"), Combine::Additive))
                .input("gain", param(format!("{filter}.gain"), Combine::Additive))
        }
        NodeKind::Delay => {
            let delay = format!("{v}_delay");
            let max_delay = controls.number("maxDelay").max(1.0);
            script.line(format!("const {delay} = ctx.createDelay({});", num(max_delay)));
            Block::default()
                .output("signal", delay.clone())
                .input("signal", Sink::Input(delay.clone()))
                .input("delayTime", param(format!("{delay}.delayTime"), Combine::Override))
        }
        NodeKind::Clip => {
            let pre = format!("{v}_pre");
            let shaper = format!("{v}_shaper");
            let amp = controls.number("amp");
            script.line(format!("const {pre} = ctx.createGain();"));
            script.line(format!("{pre}.gain.value = {};", num(1.0 / amp)));
            script.line(format!("const {shaper} = ctx.createWaveShaper();"));
            script.line(format!(
                "{shaper}.curve = new Float32Array([{}, {}]);",
                num(-amp),
                num(amp)
            ));
            script.line(format!("{pre}.connect({shaper});"));
            Block::default()
                .output("signal", shaper)
                .input("signal", Sink::Input(pre))
        }
        NodeKind::DynamicsCompressor => {
            let comp = format!("{v}_comp");
            script.line(format!("const {comp} = ctx.createDynamicsCompressor();"));
            for key in ["threshold", "knee", "ratio", "attack", "release"] {
                script.line(format!("{comp}.{key}.value = {};", num(controls.number(key))));
            }
            Block::default()
                .output("signal", comp.clone())
                .input("signal", Sink::Input(comp))
        }
        NodeKind::Transpose => {
            let gain = format!("{v}_gain");
            let ratio = transpose_ratio(controls.number("octave"), controls.number("halfstep"));
            script.line(format!("const {gain} = ctx.createGain();"));
            script.line(format!("{gain}.gain.value = {};", num(ratio)));
            Block::default()
                .output("signal", gain.clone())
                .input("signal", Sink::Input(gain))
        }
        NodeKind::KeyboardNote => emit_keyboard_note(script, &v, controls),
        NodeKind::KeyboardAdsr => {
            let gate = format!("{v}_gate");
            script.line(format!("const {gate} = ctx.createGain();"));
            script.line(format!("{gate}.gain.value = 0;"));
            script.line(format!(
                "addVoice({}, {gate}.gain, addProfile({}));",
                string(controls.choice("keyCode")),
                profile_literal(&controls.profile("adsrProfile"))
            ));
            Block::default()
                .output("signal", gate.clone())
                .input("signal", Sink::Input(gate))
        }
        NodeKind::AudioOutput => Block::default().input("signal", Sink::Input("master".into())),
        NodeKind::UniversalOutput => {
            let out = format!("{v}_out");
            script.line(format!("const {out} = ctx.createGain();"));
            script.line(format!("{out}.gain.value = {};", num(controls.number("gain"))));
            script.line(format!("{out}.connect(master);"));
            script.line(format!("const {v}_scope = ctx.createAnalyser();"));
            script.line(format!("const {v}_spectrum = ctx.createAnalyser();"));
            script.line(format!("{out}.connect({v}_scope);"));
            script.line(format!("{out}.connect({v}_spectrum);"));
            Block::default().input("signal", Sink::Input(out))
        }
        NodeKind::TimeVisualizer | NodeKind::FrequencyVisualizer | NodeKind::ConsoleDebugger => {
            script.line("// display only");
            Block::default().input("signal", Sink::Dropped)
        }
    };

    emit_inline_values(script, node, graph, &block);
    block
}

fn emit_keyboard_note(script: &mut Script, v: &str, controls: &Controls) -> Block {
    let out = format!("{v}_out");
    let oscillators = format!("{v}_osc");
    let profile = format!("{v}_profile");
    let ratio = transpose_ratio(controls.number("octave"), controls.number("halfstep"));

    script.line(format!("const {out} = ctx.createGain();"));
    script.line(format!("const {oscillators} = [];"));
    script.line(format!(
        "const {profile} = addProfile({});",
        profile_literal(&controls.profile("adsrProfile"))
    ));
    script.line("for (const [key, freq] of NOTE_MAP) {");
    script.line("  const osc = ctx.createOscillator();");
    script.line(format!("  osc.type = {};", string(controls.choice("waveform"))));
    script.line(format!("  osc.frequency.value = freq * {};", num(ratio)));
    script.line("  const gate = ctx.createGain();");
    script.line("  gate.gain.value = 0;");
    script.line("  osc.connect(gate);");
    script.line(format!("  gate.connect({out});"));
    script.line("  sources.push(osc);");
    script.line(format!("  {oscillators}.push(osc);"));
    script.line(format!("  addVoice(key, gate.gain, {profile});"));
    script.line("}");

    Block::default().output("signal", out).input(
        "additionalFrequency",
        Sink::EachParam {
            list: oscillators,
            param: "frequency",
        },
    )
}

/// Bakes the inline value of every unconnected parameter socket.
fn emit_inline_values(script: &mut Script, node: &Node, graph: &Graph, block: &Block) {
    for socket in node.inputs() {
        let Some(control) = socket.inline_control else {
            continue;
        };
        if graph.is_connected(node.id(), socket.name) {
            continue;
        }
        if let Some(Sink::Param { path, .. }) = block.sink(socket.name) {
            script.line(format!(
                "{path}.value = {};",
                num(node.controls().number(control))
            ));
        }
    }
}
