//! Adam optimizer over flat parameter slices.
//!
//! Update rule per element:
//!
//! ```text
//! m = β1·m + (1-β1)·g
//! v = β2·v + (1-β2)·g²
//! p -= lr · m̂ / (√v̂ + ε)      where m̂ = m / (1-β1ᵗ), v̂ = v / (1-β2ᵗ)
//! ```

#[derive(Debug, Clone)]
pub struct Adam {
    lr: f64,
    beta1: f64,
    beta2: f64,
    eps: f64,
    /// First moment estimates, one buffer per parameter slot.
    m: Vec<Vec<f64>>,
    /// Second moment estimates, one buffer per parameter slot.
    v: Vec<Vec<f64>>,
    t: usize,
}

impl Adam {
    /// Default: β₁=0.9, β₂=0.999, ε=1e-7
    pub fn new(lr: f64) -> Self {
        Self {
            lr,
            beta1: 0.9,
            beta2: 0.999,
            eps: 1e-7,
            m: Vec::new(),
            v: Vec::new(),
            t: 0,
        }
    }

    pub fn lr(&self) -> f64 {
        self.lr
    }

    pub fn steps(&self) -> usize {
        self.t
    }

    /// Apply one update. `params[i]` and `grads[i]` must have equal lengths.
    pub fn step(&mut self, params: &mut [&mut [f64]], grads: &[&[f64]]) {
        self.t += 1;

        if self.m.len() != params.len() {
            self.m = params.iter().map(|p| vec![0.0; p.len()]).collect();
            self.v = params.iter().map(|p| vec![0.0; p.len()]).collect();
        }

        let bias_correction1 = 1.0 - self.beta1.powi(self.t as i32);
        let bias_correction2 = 1.0 - self.beta2.powi(self.t as i32);

        for (slot, (param, grad)) in params.iter_mut().zip(grads).enumerate() {
            let m = &mut self.m[slot];
            let v = &mut self.v[slot];
            for i in 0..param.len() {
                let g = grad[i];
                m[i] = self.beta1 * m[i] + (1.0 - self.beta1) * g;
                v[i] = self.beta2 * v[i] + (1.0 - self.beta2) * g * g;

                let m_hat = m[i] / bias_correction1;
                let v_hat = v[i] / bias_correction2;
                param[i] -= self.lr * m_hat / (v_hat.sqrt() + self.eps);
            }
        }
    }
}
