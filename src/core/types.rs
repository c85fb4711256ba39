use std::sync::Arc;

/// Plain-vanilla option side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionType {
    /// Call option payoff profile.
    Call,
    /// Put option payoff profile.
    Put,
}

impl OptionType {
    /// Returns +1.0 for calls and -1.0 for puts.
    pub fn sign(self) -> f64 {
        match self {
            Self::Call => 1.0,
            Self::Put => -1.0,
        }
    }

    /// Intrinsic value `max(sign * (spot - strike), 0)`.
    #[inline]
    pub fn intrinsic(self, spot: f64, strike: f64) -> f64 {
        match self {
            Self::Call => (spot - strike).max(0.0),
            Self::Put => (strike - spot).max(0.0),
        }
    }
}

/// A function of one variable, e.g. a boundary value as a function of time.
pub type Curve = Arc<dyn Fn(f64) -> f64 + Send + Sync>;

/// A function of `(t, x)`, used for PDE coefficients and free boundaries.
pub type Surface = Arc<dyn Fn(f64, f64) -> f64 + Send + Sync>;

/// A function of `(t, x, y)`, used by the two-dimensional solvers.
pub type Function3D = Arc<dyn Fn(f64, f64, f64) -> f64 + Send + Sync>;

/// Wraps a closure as a [`Curve`].
pub fn curve<F>(f: F) -> Curve
where
    F: Fn(f64) -> f64 + Send + Sync + 'static,
{
    Arc::new(f)
}

/// A [`Curve`] returning `value` everywhere.
pub fn constant_curve(value: f64) -> Curve {
    Arc::new(move |_| value)
}

/// Wraps a closure as a [`Surface`].
pub fn surface<F>(f: F) -> Surface
where
    F: Fn(f64, f64) -> f64 + Send + Sync + 'static,
{
    Arc::new(f)
}

/// A [`Surface`] returning `value` everywhere.
pub fn constant_surface(value: f64) -> Surface {
    Arc::new(move |_, _| value)
}

/// Wraps a closure as a [`Function3D`].
pub fn function_3d<F>(f: F) -> Function3D
where
    F: Fn(f64, f64, f64) -> f64 + Send + Sync + 'static,
{
    Arc::new(f)
}

/// A [`Function3D`] returning `value` everywhere.
pub fn constant_function_3d(value: f64) -> Function3D {
    Arc::new(move |_, _, _| value)
}
