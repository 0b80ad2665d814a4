//! Controller tables, method limits and engine construction parameters.
//!
//! All limits live in [`EngineConfig`], which is handed to the engine once and
//! never changes afterwards. Controller values arrive as plain floats (the way
//! a host automates them) and are validated against these tables.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{dsp::FilterKind, engine::error::ConfigError, transport::BaseUnit, MAX_SHAPES};

/// What a stage does with its envelope value.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    Level,
    Gain,
    Balance,
    Width,
    LowPass,
    LowPassLog,
    HighPass,
    HighPassLog,
    Pitch,
    Delay,
}

impl Method {
    pub const COUNT: usize = 10;

    pub const ALL: [Method; Method::COUNT] = [
        Method::Level,
        Method::Gain,
        Method::Balance,
        Method::Width,
        Method::LowPass,
        Method::LowPassLog,
        Method::HighPass,
        Method::HighPassLog,
        Method::Pitch,
        Method::Delay,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Method::ALL.get(code as usize).copied()
    }

    /// Filter response for the filter methods.
    pub fn filter_kind(self) -> Option<FilterKind> {
        match self {
            Method::LowPass | Method::LowPassLog => Some(FilterKind::LowPass),
            Method::HighPass | Method::HighPassLog => Some(FilterKind::HighPass),
            _ => None,
        }
    }

    /// Envelope values of the log variants are log10 of a frequency.
    pub fn is_log(self) -> bool {
        matches!(self, Method::LowPassLog | Method::HighPassLog)
    }

    /// Factory limits and default envelope value.
    pub fn default_limits(self) -> MethodLimits {
        let (lo, hi) = (20f64.log10(), 20_000f64.log10());
        match self {
            Method::Level => MethodLimits::new(0.0, 1.0, 1.0),
            Method::Gain => MethodLimits::new(-70.0, 30.0, 0.0),
            Method::Balance => MethodLimits::new(-1.0, 1.0, 0.0),
            Method::Width => MethodLimits::new(0.0, 4.0, 1.0),
            Method::LowPass => MethodLimits::new(20.0, 20_000.0, 20_000.0),
            Method::LowPassLog => MethodLimits::new(lo, hi, hi),
            Method::HighPass => MethodLimits::new(20.0, 20_000.0, 20.0),
            Method::HighPassLog => MethodLimits::new(lo, hi, lo),
            Method::Pitch => MethodLimits::new(-12.0, 12.0, 0.0),
            Method::Delay => MethodLimits::new(0.0, 1000.0, 0.0),
        }
    }
}

/// Envelope value range of a method and the value a fresh shape is drawn at.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MethodLimits {
    pub min: f64,
    pub max: f64,
    pub default_end: f64,
}

impl MethodLimits {
    pub const fn new(min: f64, max: f64, default_end: f64) -> Self {
        Self {
            min,
            max,
            default_end,
        }
    }

    #[inline]
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

/// Where a stage takes its signal from.
///
/// Encoded as a controller float: `0` off, `1` audio in, `2` constant,
/// `3 + k` output of stage `k`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputSource {
    #[default]
    Off,
    AudioIn,
    /// The input amplitude itself, on both channels.
    Constant,
    Stage(usize),
}

impl InputSource {
    pub fn code(self) -> usize {
        match self {
            InputSource::Off => 0,
            InputSource::AudioIn => 1,
            InputSource::Constant => 2,
            InputSource::Stage(k) => 3 + k,
        }
    }

    pub fn from_code(code: usize) -> Option<Self> {
        match code {
            0 => Some(InputSource::Off),
            1 => Some(InputSource::AudioIn),
            2 => Some(InputSource::Constant),
            c if c - 3 < MAX_SHAPES => Some(InputSource::Stage(c - 3)),
            _ => None,
        }
    }
}

/// Where a stage's result goes besides later stages.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputRoute {
    /// Only available as input to later stages.
    #[default]
    Internal,
    /// Also summed into the audio output.
    Bus,
}

impl OutputRoute {
    pub fn code(self) -> u8 {
        match self {
            OutputRoute::Internal => 0,
            OutputRoute::Bus => 1,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(OutputRoute::Internal),
            1 => Some(OutputRoute::Bus),
            _ => None,
        }
    }
}

/// Per-stage controller slots.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageParam {
    Input,
    InputAmp,
    Method,
    DryWet,
    Output,
    OutputAmp,
}

impl StageParam {
    pub const COUNT: usize = 6;

    pub const ALL: [StageParam; StageParam::COUNT] = [
        StageParam::Input,
        StageParam::InputAmp,
        StageParam::Method,
        StageParam::DryWet,
        StageParam::Output,
        StageParam::OutputAmp,
    ];
}

/// One automatable value of the engine.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Controller {
    BaseUnit,
    BaseValue,
    Stage { stage: usize, param: StageParam },
}

/// Global controllers come first, then `StageParam::COUNT` slots per stage.
pub const CONTROLLER_COUNT: usize = 2 + MAX_SHAPES * StageParam::COUNT;

impl Controller {
    pub fn stage(stage: usize, param: StageParam) -> Self {
        Controller::Stage { stage, param }
    }

    /// Flat index, as a host would number its parameters.
    pub fn index(self) -> usize {
        match self {
            Controller::BaseUnit => 0,
            Controller::BaseValue => 1,
            Controller::Stage { stage, param } => 2 + stage * StageParam::COUNT + param as usize,
        }
    }

    pub fn from_index(index: usize) -> Result<Self, ConfigError> {
        match index {
            0 => Ok(Controller::BaseUnit),
            1 => Ok(Controller::BaseValue),
            i if i < CONTROLLER_COUNT => {
                let slot = i - 2;
                Ok(Controller::Stage {
                    stage: slot / StageParam::COUNT,
                    param: StageParam::ALL[slot % StageParam::COUNT],
                })
            }
            _ => Err(ConfigError::UnknownController(index)),
        }
    }
}

/// Declared range of a controller.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerLimits {
    pub min: f32,
    pub max: f32,
    /// Quantization step; 0 means continuous.
    pub step: f32,
}

impl ControllerLimits {
    pub const fn new(min: f32, max: f32, step: f32) -> Self {
        Self { min, max, step }
    }

    /// Clamp into range, then snap to the step grid.
    pub fn validate(&self, value: f32) -> f32 {
        let value = if value.is_finite() { value } else { self.min };
        let clamped = value.clamp(self.min, self.max);
        if self.step > 0.0 {
            let snapped = self.min + ((clamped - self.min) / self.step).round() * self.step;
            snapped.clamp(self.min, self.max)
        } else {
            clamped
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerTable {
    pub base_unit: ControllerLimits,
    pub base_value: ControllerLimits,
    pub input: ControllerLimits,
    pub input_amp: ControllerLimits,
    pub method: ControllerLimits,
    pub dry_wet: ControllerLimits,
    pub output: ControllerLimits,
    pub output_amp: ControllerLimits,
}

impl Default for ControllerTable {
    fn default() -> Self {
        Self {
            base_unit: ControllerLimits::new(0.0, 2.0, 1.0),
            base_value: ControllerLimits::new(1.0, 16.0, 0.0),
            input: ControllerLimits::new(0.0, (2 + MAX_SHAPES) as f32, 1.0),
            input_amp: ControllerLimits::new(0.0, 1.0, 0.0),
            method: ControllerLimits::new(0.0, (Method::COUNT - 1) as f32, 1.0),
            dry_wet: ControllerLimits::new(0.0, 1.0, 0.0),
            output: ControllerLimits::new(0.0, 1.0, 1.0),
            output_amp: ControllerLimits::new(0.0, 1.0, 0.0),
        }
    }
}

impl ControllerTable {
    pub fn limits(&self, controller: Controller) -> ControllerLimits {
        match controller {
            Controller::BaseUnit => self.base_unit,
            Controller::BaseValue => self.base_value,
            Controller::Stage { param, .. } => match param {
                StageParam::Input => self.input,
                StageParam::InputAmp => self.input_amp,
                StageParam::Method => self.method,
                StageParam::DryWet => self.dry_wet,
                StageParam::Output => self.output,
                StageParam::OutputAmp => self.output_amp,
            },
        }
    }
}

/// Everything the engine needs at construction. Immutable afterwards.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub sample_rate: f64,
    pub methods: [MethodLimits; Method::COUNT],
    pub controllers: ControllerTable,
    pub base_unit: BaseUnit,
    pub base_value: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000.0,
            methods: Method::ALL.map(Method::default_limits),
            controllers: ControllerTable::default(),
            base_unit: BaseUnit::Bars,
            base_value: 1.0,
        }
    }
}

impl EngineConfig {
    pub fn with_sample_rate(sample_rate: f64) -> Self {
        Self {
            sample_rate,
            ..Self::default()
        }
    }

    pub fn method_limits(&self, method: Method) -> MethodLimits {
        self.methods[method as usize]
    }
}
