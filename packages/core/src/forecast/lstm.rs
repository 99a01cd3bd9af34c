//! LSTM forward pass over exported Keras weights.
//!
//! Weight layout follows Keras: `kernel` is `[input_dim][4 * units]`,
//! `recurrent_kernel` is `[units][4 * units]` and gates are packed in the
//! order input, forget, cell, output.

use serde::{Deserialize, Serialize};

use crate::forecast::{
    artifact::check_finite,
    error::{ArtifactError, InferenceError},
    model::{check_window, ForecastModel},
    types::{ScaledForecast, ScaledWindow, VolumePair, FEATURE_COLUMNS},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateActivation {
    #[default]
    Sigmoid,
    HardSigmoid,
}

impl GateActivation {
    fn apply(self, x: f64) -> f64 {
        match self {
            GateActivation::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            GateActivation::HardSigmoid => (0.2 * x + 0.5).clamp(0.0, 1.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenseActivation {
    #[default]
    Linear,
    Relu,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LstmLayer {
    pub units: usize,
    pub kernel: Vec<Vec<f64>>,
    pub recurrent_kernel: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
    #[serde(default)]
    pub recurrent_activation: GateActivation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseLayer {
    pub kernel: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
    #[serde(default)]
    pub activation: DenseActivation,
}

/// Exported weights of a stacked LSTM followed by dense layers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LstmArtifact {
    pub window: usize,
    pub features: usize,
    pub lstm: Vec<LstmLayer>,
    pub dense: Vec<DenseLayer>,
}

#[derive(Debug, Clone)]
pub struct LstmModel {
    window: usize,
    lstm: Vec<LstmLayer>,
    dense: Vec<DenseLayer>,
}

impl LstmModel {
    pub fn from_artifact(artifact: LstmArtifact) -> Result<Self, ArtifactError> {
        if artifact.window == 0 {
            return Err(ArtifactError::invalid("window must be positive"));
        }
        if artifact.features != FEATURE_COLUMNS.len() {
            return Err(ArtifactError::invalid(format!(
                "model expects {} features, pipeline provides {}",
                artifact.features,
                FEATURE_COLUMNS.len()
            )));
        }
        if artifact.lstm.is_empty() {
            return Err(ArtifactError::invalid("at least one lstm layer is required"));
        }

        let mut input_dim = artifact.features;
        for (i, layer) in artifact.lstm.iter().enumerate() {
            validate_lstm(layer, input_dim).map_err(|msg| {
                ArtifactError::invalid(format!("lstm layer {i}: {msg}"))
            })?;
            input_dim = layer.units;
        }
        for (i, layer) in artifact.dense.iter().enumerate() {
            input_dim = validate_dense(layer, input_dim).map_err(|msg| {
                ArtifactError::invalid(format!("dense layer {i}: {msg}"))
            })?;
        }
        if input_dim != FEATURE_COLUMNS.len() {
            return Err(ArtifactError::invalid(format!(
                "model emits {input_dim} outputs, expected {}",
                FEATURE_COLUMNS.len()
            )));
        }

        Ok(Self {
            window: artifact.window,
            lstm: artifact.lstm,
            dense: artifact.dense,
        })
    }

    fn forward(&self, window: &ScaledWindow) -> Vec<f64> {
        let mut sequence: Vec<Vec<f64>> = window.steps.iter().map(|s| s.to_row()).collect();
        for layer in &self.lstm {
            sequence = run_lstm(layer, &sequence);
        }

        let mut hidden = sequence.pop().unwrap_or_default();
        for layer in &self.dense {
            hidden = run_dense(layer, &hidden);
        }
        hidden
    }
}

impl ForecastModel for LstmModel {
    fn window_len(&self) -> usize {
        self.window
    }

    fn infer(&self, window: &ScaledWindow) -> Result<ScaledForecast, InferenceError> {
        check_window(window, self.window)?;

        let output = self.forward(window);
        let pair = VolumePair::from_row(&output).ok_or(InferenceError::ShapeMismatch {
            what: "output width",
            expected: FEATURE_COLUMNS.len(),
            found: output.len(),
        })?;
        if !pair.is_finite() {
            return Err(InferenceError::NonFinite);
        }
        Ok(ScaledForecast(pair))
    }

    fn model_name(&self) -> &str {
        "lstm"
    }
}

fn validate_lstm(layer: &LstmLayer, input_dim: usize) -> Result<(), String> {
    let gates = 4 * layer.units;
    if layer.units == 0 {
        return Err("units must be positive".into());
    }
    if layer.kernel.len() != input_dim || layer.kernel.iter().any(|r| r.len() != gates) {
        return Err(format!("kernel must be {input_dim}x{gates}"));
    }
    if layer.recurrent_kernel.len() != layer.units
        || layer.recurrent_kernel.iter().any(|r| r.len() != gates)
    {
        return Err(format!("recurrent_kernel must be {}x{gates}", layer.units));
    }
    if layer.bias.len() != gates {
        return Err(format!("bias must have {gates} entries"));
    }
    finite_matrix(&layer.kernel)?;
    finite_matrix(&layer.recurrent_kernel)?;
    check_finite("bias", &layer.bias).map_err(|e| e.to_string())
}

/// Returns the layer's output width.
fn validate_dense(layer: &DenseLayer, input_dim: usize) -> Result<usize, String> {
    let width = layer.bias.len();
    if width == 0 {
        return Err("bias must not be empty".into());
    }
    if layer.kernel.len() != input_dim || layer.kernel.iter().any(|r| r.len() != width) {
        return Err(format!("kernel must be {input_dim}x{width}"));
    }
    finite_matrix(&layer.kernel)?;
    check_finite("bias", &layer.bias).map_err(|e| e.to_string())?;
    Ok(width)
}

fn finite_matrix(matrix: &[Vec<f64>]) -> Result<(), String> {
    matrix
        .iter()
        .try_for_each(|row| check_finite("kernel", row))
        .map_err(|e| e.to_string())
}

/// Add `vector * matrix` into `acc`.
fn accumulate(acc: &mut [f64], vector: &[f64], matrix: &[Vec<f64>]) {
    for (x, row) in vector.iter().zip(matrix) {
        for (a, w) in acc.iter_mut().zip(row) {
            *a += x * w;
        }
    }
}

fn run_lstm(layer: &LstmLayer, inputs: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let units = layer.units;
    let gate = layer.recurrent_activation;
    let mut h = vec![0.0; units];
    let mut c = vec![0.0; units];
    let mut outputs = Vec::with_capacity(inputs.len());

    for x in inputs {
        let mut z = layer.bias.clone();
        accumulate(&mut z, x, &layer.kernel);
        accumulate(&mut z, &h, &layer.recurrent_kernel);

        for u in 0..units {
            let i = gate.apply(z[u]);
            let f = gate.apply(z[units + u]);
            let g = z[2 * units + u].tanh();
            let o = gate.apply(z[3 * units + u]);
            c[u] = f * c[u] + i * g;
            h[u] = o * c[u].tanh();
        }
        outputs.push(h.clone());
    }
    outputs
}

fn run_dense(layer: &DenseLayer, input: &[f64]) -> Vec<f64> {
    let mut out = layer.bias.clone();
    accumulate(&mut out, input, &layer.kernel);
    if layer.activation == DenseActivation::Relu {
        out.iter_mut().for_each(|v| *v = v.max(0.0));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zero_lstm(input_dim: usize, units: usize) -> LstmLayer {
        LstmLayer {
            units,
            kernel: vec![vec![0.0; 4 * units]; input_dim],
            recurrent_kernel: vec![vec![0.0; 4 * units]; units],
            bias: vec![0.0; 4 * units],
            recurrent_activation: GateActivation::Sigmoid,
        }
    }

    fn dense(kernel: Vec<Vec<f64>>, bias: Vec<f64>) -> DenseLayer {
        DenseLayer {
            kernel,
            bias,
            activation: DenseActivation::Linear,
        }
    }

    fn window(len: usize) -> ScaledWindow {
        ScaledWindow {
            steps: vec![VolumePair::new(0.3, 0.7); len],
        }
    }

    #[test]
    fn zero_weights_emit_the_output_bias() {
        let model = LstmModel::from_artifact(LstmArtifact {
            window: 6,
            features: 2,
            lstm: vec![zero_lstm(2, 3)],
            dense: vec![dense(vec![vec![1.0, 1.0]; 3], vec![0.25, 0.75])],
        })
        .unwrap();

        let out = model.infer(&window(6)).unwrap();
        assert_eq!(out, ScaledForecast(VolumePair::new(0.25, 0.75)));
    }

    #[test]
    fn single_unit_step_matches_hand_computation() {
        // One unit, only the cell gate sees the first feature; every other
        // gate sits at sigmoid(0) = 0.5.
        let mut layer = zero_lstm(2, 1);
        layer.kernel[0][2] = 1.0;
        let model = LstmModel::from_artifact(LstmArtifact {
            window: 1,
            features: 2,
            lstm: vec![layer],
            dense: vec![dense(vec![vec![1.0, -1.0]], vec![0.0, 0.0])],
        })
        .unwrap();

        let input = ScaledWindow {
            steps: vec![VolumePair::new(0.5, 0.9)],
        };
        let c = 0.5 * 0.5_f64.tanh();
        let h = 0.5 * c.tanh();

        let out = model.infer(&input).unwrap().0;
        assert!((out.volume_out - h).abs() < 1e-12);
        assert!((out.volume_in + h).abs() < 1e-12);
    }

    #[test]
    fn hard_sigmoid_is_piecewise_linear() {
        assert_eq!(GateActivation::HardSigmoid.apply(0.0), 0.5);
        assert_eq!(GateActivation::HardSigmoid.apply(10.0), 1.0);
        assert_eq!(GateActivation::HardSigmoid.apply(-10.0), 0.0);
    }

    #[test]
    fn relu_clamps_negative_outputs() {
        let layer = DenseLayer {
            kernel: vec![vec![1.0, -1.0]],
            bias: vec![0.0, 0.0],
            activation: DenseActivation::Relu,
        };
        assert_eq!(run_dense(&layer, &[2.0]), vec![2.0, 0.0]);
    }

    #[test]
    fn stacked_layers_chain_their_widths() {
        let model = LstmModel::from_artifact(LstmArtifact {
            window: 6,
            features: 2,
            lstm: vec![zero_lstm(2, 4), zero_lstm(4, 2)],
            dense: vec![],
        });
        assert!(model.is_ok());
    }

    #[test]
    fn wrong_kernel_shape_is_rejected() {
        let result = LstmModel::from_artifact(LstmArtifact {
            window: 6,
            features: 2,
            lstm: vec![zero_lstm(3, 2)],
            dense: vec![],
        });
        assert!(matches!(result, Err(ArtifactError::Invalid { .. })));
    }

    #[test]
    fn wrong_output_width_is_rejected() {
        let result = LstmModel::from_artifact(LstmArtifact {
            window: 6,
            features: 2,
            lstm: vec![zero_lstm(2, 3)],
            dense: vec![dense(vec![vec![1.0]; 3], vec![0.0])],
        });
        assert!(matches!(result, Err(ArtifactError::Invalid { .. })));
    }

    #[test]
    fn window_length_mismatch_is_inference_error() {
        let model = LstmModel::from_artifact(LstmArtifact {
            window: 6,
            features: 2,
            lstm: vec![zero_lstm(2, 2)],
            dense: vec![],
        })
        .unwrap();

        let err = model.infer(&window(5)).unwrap_err();
        assert!(matches!(err, InferenceError::ShapeMismatch { expected: 6, found: 5, .. }));
    }

    #[test]
    fn non_finite_input_is_reported() {
        let model = LstmModel::from_artifact(LstmArtifact {
            window: 1,
            features: 2,
            lstm: vec![zero_lstm(2, 2)],
            dense: vec![dense(vec![vec![1.0, 0.0], vec![0.0, 1.0]], vec![0.0, 0.0])],
        })
        .unwrap();
        // Zero kernel times NaN is still NaN.
        let input = ScaledWindow {
            steps: vec![VolumePair::new(f64::NAN, 0.0)],
        };
        assert_eq!(model.infer(&input).unwrap_err(), InferenceError::NonFinite);
    }
}
