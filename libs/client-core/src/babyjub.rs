//! Baby Jubjub curve
//!
//! Twisted Edwards curve `a·x² + y² = 1 + d·x²·y²` over the BN254 scalar
//! field, with `a = 168700` and `d = 168696`. Scalar multiplication runs in
//! projective coordinates and normalises once at the end.

use num_bigint::BigUint;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::field::FieldElement;

static A: Lazy<FieldElement> = Lazy::new(|| FieldElement::from_u64(168_700));
static D: Lazy<FieldElement> = Lazy::new(|| FieldElement::from_u64(168_696));

static BASE8: Lazy<Point> = Lazy::new(|| Point {
    x: constant("5299619240641551281634865583518297030282874472190772894086521144482721001553"),
    y: constant("16950150798460657717958625567821834550301663161624707787222815936182638968203"),
});

static SUB_ORDER: Lazy<BigUint> = Lazy::new(|| {
    BigUint::parse_bytes(
        b"2736030358979909402780800718157159386076813972158567259200215660948447373041",
        10,
    )
    .expect("sub-group order literal")
});

fn constant(decimal: &str) -> FieldElement {
    decimal.parse().expect("curve constant literal")
}

/// Generator of the prime-order subgroup.
pub fn base8() -> &'static Point {
    &BASE8
}

/// Order of the subgroup generated by [`base8`].
pub fn sub_order() -> &'static BigUint {
    &SUB_ORDER
}

/// Affine curve point.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: FieldElement,
    pub y: FieldElement,
}

impl Point {
    pub fn new(x: FieldElement, y: FieldElement) -> Self {
        Self { x, y }
    }

    /// Neutral element `(0, 1)`.
    pub fn identity() -> Self {
        Self {
            x: FieldElement::zero(),
            y: FieldElement::one(),
        }
    }

    pub fn is_on_curve(&self) -> bool {
        let x2 = self.x.square();
        let y2 = self.y.square();
        let lhs = &(&*A * &x2) + &y2;
        let rhs = &FieldElement::one() + &(&*D * &(&x2 * &y2));
        lhs == rhs
    }

    /// Sum of two subgroup points.
    pub fn add(&self, other: &Point) -> Point {
        expect_affine(self.checked_add(other))
    }

    /// `scalar · self` for a subgroup point.
    pub fn mul_scalar(&self, scalar: &BigUint) -> Point {
        expect_affine(self.checked_mul_scalar(scalar))
    }

    /// Sum of two arbitrary points; `None` when the projective result has
    /// `z = 0`, which only happens for inputs off the curve.
    pub fn checked_add(&self, other: &Point) -> Option<Point> {
        Projective::from(self).add(&Projective::from(other)).to_affine()
    }

    /// `scalar · self` by double-and-add from the most significant bit.
    pub fn checked_mul_scalar(&self, scalar: &BigUint) -> Option<Point> {
        let base = Projective::from(self);
        let mut acc = Projective::identity();
        for i in (0..scalar.bits()).rev() {
            acc = acc.add(&acc);
            if scalar.bit(i) {
                acc = acc.add(&base);
            }
        }
        acc.to_affine()
    }
}

fn expect_affine(point: Option<Point>) -> Point {
    debug_assert!(point.is_some(), "projective result with z = 0 from a point off the curve");
    point.unwrap_or_else(Point::identity)
}

#[derive(Debug, Clone)]
struct Projective {
    x: FieldElement,
    y: FieldElement,
    z: FieldElement,
}

impl Projective {
    fn identity() -> Self {
        Self {
            x: FieldElement::zero(),
            y: FieldElement::one(),
            z: FieldElement::one(),
        }
    }

    // add-2008-bbjlp; complete on this curve, so it also doubles
    fn add(&self, other: &Projective) -> Projective {
        let a = &self.z * &other.z;
        let b = a.square();
        let c = &self.x * &other.x;
        let d = &self.y * &other.y;
        let e = &(&*D * &c) * &d;
        let f = &b - &e;
        let g = &b + &e;

        let sum_self = &self.x + &self.y;
        let sum_other = &other.x + &other.y;
        let cross = &(&(&sum_self * &sum_other) - &c) - &d;

        Projective {
            x: &(&a * &f) * &cross,
            y: &(&a * &g) * &(&d - &(&*A * &c)),
            z: &f * &g,
        }
    }

    fn to_affine(&self) -> Option<Point> {
        let z_inv = self.z.inverse()?;
        Some(Point {
            x: &self.x * &z_inv,
            y: &self.y * &z_inv,
        })
    }
}

impl From<&Point> for Projective {
    fn from(p: &Point) -> Self {
        Projective {
            x: p.x.clone(),
            y: p.y.clone(),
            z: FieldElement::one(),
        }
    }
}
