//! Coefficient sets of the one-dimensional convection-diffusion PDE
//!
//! `∂V/∂t + a(t,x) ∂²V/∂x² + b(t,x) ∂V/∂x + c(t,x) V = 0`
//!
//! in its standard form, the full form with `∂²[α V]/∂x²` and `∂[β V]/∂x`, and the coupled form
//! that adds `λ W` for the unknown `W` of a partner equation.
//!
//! Equality of coefficient sets is identity of the wrapped functions: two sets compare equal
//! only when they share the same `Arc` allocations.

use std::fmt;
use std::sync::Arc;

use crate::core::{PdeError, Surface};

/// Borrowed view used for exhaustive dispatch over the coefficient forms.
#[derive(Debug, Clone, Copy)]
pub enum CoefficientsRef<'a> {
    Standard(&'a StandardCoefficients),
    Full(&'a FullCoefficients),
    Coupled(&'a CoupledCoefficients),
}

/// Access to the `a`, `b` and `c` terms shared by every coefficient form.
pub trait ConvectionDiffusionCoefficients: fmt::Debug + Send + Sync {
    /// Diffusion term.
    fn a(&self, t: f64, x: f64) -> f64;
    /// Convection term.
    fn b(&self, t: f64, x: f64) -> f64;
    /// Reaction term.
    fn c(&self, t: f64, x: f64) -> f64;
    /// The concrete form of this coefficient set.
    fn variant(&self) -> CoefficientsRef<'_>;
}

/// `a`, `b` and `c` as functions of `(t, x)`.
#[derive(Clone)]
pub struct StandardCoefficients {
    a: Surface,
    b: Surface,
    c: Surface,
}

impl StandardCoefficients {
    pub fn new(a: Surface, b: Surface, c: Surface) -> Self {
        Self { a, b, c }
    }

    pub fn a_surface(&self) -> &Surface {
        &self.a
    }

    pub fn b_surface(&self) -> &Surface {
        &self.b
    }

    pub fn c_surface(&self) -> &Surface {
        &self.c
    }
}

impl fmt::Debug for StandardCoefficients {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StandardCoefficients")
            .field("a", &Arc::as_ptr(&self.a))
            .field("b", &Arc::as_ptr(&self.b))
            .field("c", &Arc::as_ptr(&self.c))
            .finish()
    }
}

impl PartialEq for StandardCoefficients {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.a, &other.a)
            && Arc::ptr_eq(&self.b, &other.b)
            && Arc::ptr_eq(&self.c, &other.c)
    }
}

impl ConvectionDiffusionCoefficients for StandardCoefficients {
    #[inline]
    fn a(&self, t: f64, x: f64) -> f64 {
        (self.a)(t, x)
    }

    #[inline]
    fn b(&self, t: f64, x: f64) -> f64 {
        (self.b)(t, x)
    }

    #[inline]
    fn c(&self, t: f64, x: f64) -> f64 {
        (self.c)(t, x)
    }

    fn variant(&self) -> CoefficientsRef<'_> {
        CoefficientsRef::Standard(self)
    }
}

/// Standard coefficients plus the inner weights `α` and `β` of
/// `a ∂²[α V]/∂x² + b ∂[β V]/∂x + c V`.
#[derive(Clone)]
pub struct FullCoefficients {
    standard: StandardCoefficients,
    alpha: Surface,
    beta: Surface,
}

impl FullCoefficients {
    pub fn new(a: Surface, b: Surface, c: Surface, alpha: Surface, beta: Surface) -> Self {
        Self {
            standard: StandardCoefficients::new(a, b, c),
            alpha,
            beta,
        }
    }

    pub fn standard(&self) -> &StandardCoefficients {
        &self.standard
    }

    #[inline]
    pub fn alpha(&self, t: f64, x: f64) -> f64 {
        (self.alpha)(t, x)
    }

    #[inline]
    pub fn beta(&self, t: f64, x: f64) -> f64 {
        (self.beta)(t, x)
    }
}

impl fmt::Debug for FullCoefficients {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FullCoefficients")
            .field("standard", &self.standard)
            .field("alpha", &Arc::as_ptr(&self.alpha))
            .field("beta", &Arc::as_ptr(&self.beta))
            .finish()
    }
}

impl PartialEq for FullCoefficients {
    fn eq(&self, other: &Self) -> bool {
        self.standard == other.standard
            && Arc::ptr_eq(&self.alpha, &other.alpha)
            && Arc::ptr_eq(&self.beta, &other.beta)
    }
}

impl ConvectionDiffusionCoefficients for FullCoefficients {
    fn a(&self, t: f64, x: f64) -> f64 {
        self.standard.a(t, x)
    }

    fn b(&self, t: f64, x: f64) -> f64 {
        self.standard.b(t, x)
    }

    fn c(&self, t: f64, x: f64) -> f64 {
        self.standard.c(t, x)
    }

    fn variant(&self) -> CoefficientsRef<'_> {
        CoefficientsRef::Full(self)
    }
}

/// Standard coefficients plus a constant coupling `λ` to a partner equation.
#[derive(Clone)]
pub struct CoupledCoefficients {
    standard: StandardCoefficients,
    lambda: f64,
}

impl CoupledCoefficients {
    pub fn new(a: Surface, b: Surface, c: Surface, lambda: f64) -> Result<Self, PdeError> {
        if !lambda.is_finite() {
            return Err(PdeError::invalid("coupling constant must be finite"));
        }
        Ok(Self {
            standard: StandardCoefficients::new(a, b, c),
            lambda,
        })
    }

    pub fn standard(&self) -> &StandardCoefficients {
        &self.standard
    }

    pub fn lambda(&self) -> f64 {
        self.lambda
    }
}

impl fmt::Debug for CoupledCoefficients {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoupledCoefficients")
            .field("standard", &self.standard)
            .field("lambda", &self.lambda)
            .finish()
    }
}

impl PartialEq for CoupledCoefficients {
    fn eq(&self, other: &Self) -> bool {
        self.standard == other.standard && self.lambda.to_bits() == other.lambda.to_bits()
    }
}

impl ConvectionDiffusionCoefficients for CoupledCoefficients {
    fn a(&self, t: f64, x: f64) -> f64 {
        self.standard.a(t, x)
    }

    fn b(&self, t: f64, x: f64) -> f64 {
        self.standard.b(t, x)
    }

    fn c(&self, t: f64, x: f64) -> f64 {
        self.standard.c(t, x)
    }

    fn variant(&self) -> CoefficientsRef<'_> {
        CoefficientsRef::Coupled(self)
    }
}

/// Any of the three coefficient forms.
#[derive(Debug, Clone, PartialEq)]
pub enum Pde1dCoefficients {
    Standard(StandardCoefficients),
    Full(FullCoefficients),
    Coupled(CoupledCoefficients),
}

impl Pde1dCoefficients {
    fn inner(&self) -> &dyn ConvectionDiffusionCoefficients {
        match self {
            Self::Standard(c) => c,
            Self::Full(c) => c,
            Self::Coupled(c) => c,
        }
    }
}

impl ConvectionDiffusionCoefficients for Pde1dCoefficients {
    fn a(&self, t: f64, x: f64) -> f64 {
        self.inner().a(t, x)
    }

    fn b(&self, t: f64, x: f64) -> f64 {
        self.inner().b(t, x)
    }

    fn c(&self, t: f64, x: f64) -> f64 {
        self.inner().c(t, x)
    }

    fn variant(&self) -> CoefficientsRef<'_> {
        self.inner().variant()
    }
}

impl From<StandardCoefficients> for Pde1dCoefficients {
    fn from(value: StandardCoefficients) -> Self {
        Self::Standard(value)
    }
}

impl From<FullCoefficients> for Pde1dCoefficients {
    fn from(value: FullCoefficients) -> Self {
        Self::Full(value)
    }
}

impl From<CoupledCoefficients> for Pde1dCoefficients {
    fn from(value: CoupledCoefficients) -> Self {
        Self::Coupled(value)
    }
}
