use crate::error::{MonitorError, Result};
use crate::loss::criterion::{Criterion, LossOutput};
use crate::math::matrix::Matrix;

/// Softmax cross-entropy over raw logits, averaged over the batch.
#[derive(Debug, Clone, Copy, Default)]
pub struct CrossEntropyLoss;

/// Small epsilon added inside log() to prevent log(0) = -inf.
const EPS: f64 = 1e-12;

impl CrossEntropyLoss {
    /// Row-wise softmax, shifted by each row's maximum for stability.
    pub fn softmax(logits: &Matrix) -> Matrix {
        let mut probs = logits.clone();
        for r in 0..probs.rows {
            let row = probs.row_mut(r);
            let max = row.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let mut sum = 0.0;
            for x in row.iter_mut() {
                *x = (*x - max).exp();
                sum += *x;
            }
            for x in row.iter_mut() {
                *x /= sum;
            }
        }
        probs
    }
}

impl Criterion for CrossEntropyLoss {
    /// L = mean_i( -log(softmax(z_i)[y_i] + eps) )
    ///
    /// The gradient w.r.t. the logits simplifies to
    /// `(softmax(z) - onehot(y)) / batch_len`.
    fn loss(&self, outputs: &Matrix, labels: &[usize]) -> Result<LossOutput> {
        if outputs.rows != labels.len() {
            return Err(MonitorError::Data(format!(
                "{} output rows but {} labels",
                outputs.rows,
                labels.len()
            )));
        }
        if let Some(&bad) = labels.iter().find(|&&y| y >= outputs.cols) {
            return Err(MonitorError::Data(format!(
                "label {} out of range for {} classes",
                bad, outputs.cols
            )));
        }
        if labels.is_empty() {
            return Ok(LossOutput { value: 0.0, grad: outputs.clone() });
        }

        let n = labels.len() as f64;
        let mut grad = CrossEntropyLoss::softmax(outputs);
        let mut total = 0.0;
        for (r, &y) in labels.iter().enumerate() {
            let row = grad.row_mut(r);
            total -= (row[y] + EPS).ln();
            row[y] -= 1.0;
            row.iter_mut().for_each(|g| *g /= n);
        }

        Ok(LossOutput { value: total / n, grad })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_logits_cost_log_of_class_count() {
        let logits = Matrix::zeros(2, 4);
        let out = CrossEntropyLoss.loss(&logits, &[0, 3]).unwrap();
        assert!((out.value - 4f64.ln()).abs() < 1e-9);
    }

    #[test]
    fn gradient_rows_sum_to_zero() {
        let logits = Matrix::from_vec(2, 3, vec![1.0, 2.0, 3.0, -1.0, 0.0, 4.0]);
        let out = CrossEntropyLoss.loss(&logits, &[2, 0]).unwrap();
        for r in 0..2 {
            assert!(out.grad.row(r).iter().sum::<f64>().abs() < 1e-12);
        }
        assert!(out.grad.get(0, 2) < 0.0);
    }

    #[test]
    fn confident_correct_prediction_is_nearly_free() {
        let logits = Matrix::from_vec(1, 2, vec![50.0, -50.0]);
        let out = CrossEntropyLoss.loss(&logits, &[0]).unwrap();
        assert!(out.value < 1e-9);
    }

    #[test]
    fn out_of_range_label_is_a_data_error() {
        let err = CrossEntropyLoss.loss(&Matrix::zeros(1, 2), &[2]).unwrap_err();
        assert!(matches!(err, MonitorError::Data(_)));
    }
}
