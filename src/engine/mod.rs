//! The per-sample effect chain.
//!
//! [`ShaperEngine`] owns `MAX_SHAPES` stages, the transport and the controller
//! values. Control happens between samples (controller changes, node edits,
//! transport events); audio runs through [`ShaperEngine::process`] or one of
//! its variants that apply queued or timed messages first.

pub mod config;
pub mod error;
pub mod message;
pub mod monitor;
pub mod stage;

use log::{debug, warn};

pub use config::{
    Controller, ControllerLimits, EngineConfig, InputSource, Method, MethodLimits, OutputRoute,
    StageParam, CONTROLLER_COUNT,
};
pub use error::ConfigError;
pub use message::{MessageReceiver, ShaperMessage, TimedMessage};
pub use monitor::{Monitor, MonitorBucket};
pub use stage::Stage;

use crate::{
    dsp::Frame,
    io::state::{self, DecodedShape},
    shape::{Node, Shape},
    transport::{BaseUnit, Transport},
    MAX_SHAPES,
};

/*
Signal Flow
===========

For every frame:

    pos = transport.position(frame)

    for stage i in 0..MAX_SHAPES (skipping stages with input Off):
        in   = audio in   * input_amp     (AudioIn)
             | input_amp on both channels (Constant)
             | result[k]  * input_amp     (Stage(k), k < i)
        v    = clamp(shape_i(pos), method limits)
        wet  = method(in, v)
        out  = (1 - dry_wet) in + dry_wet wet
        result[i] = out
        if routed to the bus: bus += out * output_amp

    audio out = bus

A stage can only read stages with a lower index, so every result it needs
is already computed in the same frame. Wiring a later stage into an earlier
one is refused when the controller changes, not in the audio loop.

While the transport is halted (tempo below 1 bpm, or stopped outside
seconds mode) every block is silent and filter histories are cleared, so
playback restarts without a burst from stale filter state.
*/

pub struct ShaperEngine {
    config: EngineConfig,
    transport: Transport,
    stages: [Stage; MAX_SHAPES],
    controllers: [f32; CONTROLLER_COUNT],
    frame: u64,
}

impl ShaperEngine {
    /// Build an engine. Stage 0 reads the audio input and feeds the output
    /// bus; the other stages start switched off. All stages start on
    /// [`Method::Level`] with a flat default shape.
    pub fn new(config: EngineConfig) -> Self {
        let sample_rate = config.sample_rate;
        let level = config.method_limits(Method::Level);
        let mut stages: [Stage; MAX_SHAPES] =
            std::array::from_fn(|_| Stage::new(Method::Level, level, sample_rate));
        stages[0].input = InputSource::AudioIn;
        stages[0].output = OutputRoute::Bus;

        let mut transport = Transport::new(sample_rate);
        transport.set_base(config.base_unit, config.base_value, 0);

        let mut controllers = [0.0; CONTROLLER_COUNT];
        controllers[Controller::BaseUnit.index()] = config.base_unit.code() as f32;
        controllers[Controller::BaseValue.index()] = config.base_value as f32;
        for (index, stage) in stages.iter().enumerate() {
            let values = [
                (StageParam::Input, stage.input.code() as f32),
                (StageParam::InputAmp, stage.input_amp),
                (StageParam::Method, stage.method.code() as f32),
                (StageParam::DryWet, stage.dry_wet),
                (StageParam::Output, stage.output.code() as f32),
                (StageParam::OutputAmp, stage.output_amp),
            ];
            for (param, value) in values {
                controllers[Controller::stage(index, param).index()] = value;
            }
        }

        Self {
            config,
            transport,
            stages,
            controllers,
            frame: 0,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Frames processed so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn is_halted(&self) -> bool {
        self.transport.is_halted()
    }

    /// Cyclic position the next frame will be processed at.
    pub fn position(&self) -> f64 {
        self.transport.position(self.frame)
    }

    pub fn stage(&self, index: usize) -> Option<&Stage> {
        self.stages.get(index)
    }

    pub fn shape(&self, stage: usize) -> Option<&Shape> {
        self.stages.get(stage).map(Stage::shape)
    }

    pub fn monitor(&self, stage: usize) -> Option<&Monitor> {
        self.stages.get(stage).map(Stage::monitor)
    }

    /// Current (validated) value of a controller.
    pub fn controller(&self, controller: Controller) -> Option<f32> {
        self.controllers.get(controller.index()).copied()
    }

    /// Validate and apply a controller value. Values equal to the current one
    /// are accepted without side effects.
    pub fn set_controller(&mut self, controller: Controller, value: f32) -> Result<(), ConfigError> {
        if let Controller::Stage { stage, .. } = controller {
            if stage >= MAX_SHAPES {
                return Err(ConfigError::StageOutOfRange(stage));
            }
        }

        let value = self.config.controllers.limits(controller).validate(value);
        let slot = controller.index();
        if self.controllers[slot] == value {
            return Ok(());
        }

        match controller {
            Controller::BaseUnit => {
                let unit = BaseUnit::from_code(value as u8).unwrap_or_default();
                self.transport
                    .set_base(unit, self.transport.base_value(), self.frame);
            }
            Controller::BaseValue => {
                self.transport
                    .set_base(self.transport.base_unit(), value as f64, self.frame);
            }
            Controller::Stage { stage, param } => self.apply_stage_param(stage, param, value)?,
        }

        self.controllers[slot] = value;
        Ok(())
    }

    /// Convenience over [`ShaperEngine::set_controller`] for the input source.
    pub fn set_input_source(&mut self, stage: usize, source: InputSource) -> Result<(), ConfigError> {
        self.set_controller(
            Controller::stage(stage, StageParam::Input),
            source.code() as f32,
        )
    }

    pub fn set_method(&mut self, stage: usize, method: Method) -> Result<(), ConfigError> {
        self.set_controller(
            Controller::stage(stage, StageParam::Method),
            method.code() as f32,
        )
    }

    fn apply_stage_param(&mut self, index: usize, param: StageParam, value: f32) -> Result<(), ConfigError> {
        let limits = self.config.methods;
        let stage = &mut self.stages[index];

        match param {
            StageParam::Input => {
                let source = InputSource::from_code(value as usize).unwrap_or_default();
                if let InputSource::Stage(input) = source {
                    if input >= index {
                        return Err(ConfigError::ForwardStageInput {
                            stage: index,
                            input,
                        });
                    }
                }
                stage.input = source;
            }
            StageParam::InputAmp => stage.input_amp = value,
            StageParam::Method => {
                let method = Method::from_code(value as u8).unwrap_or_default();
                stage.set_method(method, limits[method as usize]);
            }
            StageParam::DryWet => stage.dry_wet = value,
            StageParam::Output => {
                stage.output = OutputRoute::from_code(value as u8).unwrap_or_default();
            }
            StageParam::OutputAmp => stage.output_amp = value,
        }

        Ok(())
    }

    pub fn insert_node(&mut self, stage: usize, node: Node) -> bool {
        self.stages
            .get_mut(stage)
            .is_some_and(|s| s.shape.insert_node(node))
    }

    pub fn change_node(&mut self, stage: usize, index: usize, node: Node) -> bool {
        self.stages
            .get_mut(stage)
            .is_some_and(|s| s.shape.change_node(index, node))
    }

    pub fn delete_node(&mut self, stage: usize, index: usize) -> bool {
        self.stages
            .get_mut(stage)
            .is_some_and(|s| s.shape.delete_node(index))
    }

    pub fn clear_shape(&mut self, stage: usize) -> bool {
        match self.stages.get_mut(stage) {
            Some(s) => {
                s.shape.clear_shape();
                true
            }
            None => false,
        }
    }

    /// Replace a whole shape. Falls back to the default shape on bad data.
    pub fn load_shape(&mut self, stage: usize, nodes: &[Node]) -> bool {
        self.stages
            .get_mut(stage)
            .is_some_and(|s| s.shape.load_nodes(nodes))
    }

    /// Apply one control message at the current frame.
    pub fn handle_message(&mut self, message: ShaperMessage) {
        match message {
            ShaperMessage::SetController { controller, value } => {
                if let Err(err) = self.set_controller(controller, value) {
                    warn!("rejected controller change: {err}");
                }
            }
            ShaperMessage::SetBase { unit, value } => {
                let unit_value = unit.code() as f32;
                let results = [
                    self.set_controller(Controller::BaseUnit, unit_value),
                    self.set_controller(Controller::BaseValue, value as f32),
                ];
                for err in results.into_iter().filter_map(Result::err) {
                    warn!("rejected base change: {err}");
                }
            }
            ShaperMessage::InsertNode { stage, node } => {
                if !self.insert_node(stage, node) {
                    debug!("insert into stage {stage} rejected");
                }
            }
            ShaperMessage::ChangeNode { stage, index, node } => {
                if !self.change_node(stage, index, node) {
                    debug!("change of node {index} in stage {stage} rejected");
                }
            }
            ShaperMessage::DeleteNode { stage, index } => {
                if !self.delete_node(stage, index) {
                    debug!("delete of node {index} in stage {stage} rejected");
                }
            }
            ShaperMessage::ClearShape { stage } => {
                self.clear_shape(stage);
            }
            ShaperMessage::Transport(state) => self.transport.update(state, self.frame),
            ShaperMessage::Position { bar, bar_beat } => {
                self.transport.relocate(bar, bar_beat, self.frame)
            }
        }
    }

    /// Apply every message waiting in `rx`.
    pub fn drain_messages<R: MessageReceiver>(&mut self, rx: &mut R) {
        while let Some(message) = rx.pop() {
            self.handle_message(message);
        }
    }

    /// Drain `rx`, then process one block.
    pub fn render_block<R: MessageReceiver>(
        &mut self,
        rx: &mut R,
        input: [&[f32]; 2],
        output: [&mut [f32]; 2],
    ) {
        self.drain_messages(rx);
        self.process(input, output);
    }

    /// Process one block. Frames beyond the shortest of the four slices are
    /// left untouched.
    pub fn process(&mut self, input: [&[f32]; 2], output: [&mut [f32]; 2]) {
        let [in_left, in_right] = input;
        let [out_left, out_right] = output;
        let len = in_left
            .len()
            .min(in_right.len())
            .min(out_left.len())
            .min(out_right.len());

        self.run(
            &in_left[..len],
            &in_right[..len],
            &mut out_left[..len],
            &mut out_right[..len],
        );
    }

    /// Process one block, applying each message at its frame offset. Messages
    /// must be sorted by offset; offsets past the block apply at its end.
    pub fn process_with_messages(
        &mut self,
        input: [&[f32]; 2],
        output: [&mut [f32]; 2],
        messages: &[TimedMessage],
    ) {
        let [in_left, in_right] = input;
        let [out_left, out_right] = output;
        let len = in_left
            .len()
            .min(in_right.len())
            .min(out_left.len())
            .min(out_right.len());

        let mut start = 0;
        for timed in messages {
            let end = timed.offset.clamp(start, len);
            if end > start {
                self.run(
                    &in_left[start..end],
                    &in_right[start..end],
                    &mut out_left[start..end],
                    &mut out_right[start..end],
                );
                start = end;
            }
            self.handle_message(timed.message);
        }

        if start < len {
            self.run(
                &in_left[start..len],
                &in_right[start..len],
                &mut out_left[start..len],
                &mut out_right[start..len],
            );
        }
    }

    fn run(&mut self, in_left: &[f32], in_right: &[f32], out_left: &mut [f32], out_right: &mut [f32]) {
        if self.transport.is_halted() {
            out_left.fill(0.0);
            out_right.fill(0.0);
            for stage in &mut self.stages {
                stage.clear_filters();
            }
            self.frame += out_left.len() as u64;
            return;
        }

        let sample_rate = self.config.sample_rate;
        let frames = in_left.iter().zip(in_right).zip(out_left.iter_mut().zip(out_right));

        for ((&left, &right), (out_l, out_r)) in frames {
            let position = self.transport.position(self.frame);
            let audio = Frame::new(left, right);
            let mut results = [Frame::SILENCE; MAX_SHAPES];
            let mut bus = Frame::SILENCE;

            for (index, stage) in self.stages.iter_mut().enumerate() {
                let input = match stage.input {
                    InputSource::Off => continue,
                    InputSource::AudioIn => audio * stage.input_amp,
                    InputSource::Constant => Frame::mono(stage.input_amp),
                    InputSource::Stage(k) if k < index => results[k] * stage.input_amp,
                    InputSource::Stage(_) => Frame::SILENCE,
                };

                let limits = self.config.methods[stage.method as usize];
                let out = stage.process_frame(input, position, &limits, sample_rate);
                results[index] = out;

                if stage.output == OutputRoute::Bus {
                    bus += out * stage.output_amp;
                }
            }

            *out_l = bus.left;
            *out_r = bus.right;
            self.frame += 1;
        }
    }

    /// Every shape in the textual state format.
    pub fn save_state(&self) -> String {
        state::encode_shapes(self.stages.iter().map(|s| s.shape.nodes()))
    }

    /// Restore shapes from [`ShaperEngine::save_state`] output. Shapes that
    /// are missing or fail to parse fall back to their default; the others
    /// are kept. Returns the number of shapes restored from `text`.
    pub fn restore_state(&mut self, text: &str) -> usize {
        let decoded = state::decode_shapes(text);
        let mut restored = 0;

        for (index, (stage, shape)) in self.stages.iter_mut().zip(decoded).enumerate() {
            match shape {
                DecodedShape::Nodes(nodes) => {
                    if stage.shape.load_nodes(&nodes) {
                        restored += 1;
                    } else {
                        warn!("stored shape {index} is not a valid shape, using default");
                    }
                }
                DecodedShape::Invalid => stage.shape.set_default_shape(),
                DecodedShape::Missing => {
                    debug!("no stored shape {index}, using default");
                    stage.shape.set_default_shape();
                }
            }
        }

        restored
    }
}

impl Default for ShaperEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
