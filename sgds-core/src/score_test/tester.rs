//! Per-worker entry point for the score tests.

use super::{
    binary, quantitative, BinaryResult, QuantitativeResult, ScoreBuffers, ScoreError, VariantResult,
};
use crate::model::{ModelContext, TraitType};
use crate::spa::{SaddlePointSolver, TailProbabilitySolver};

/// Borrows a shared model and owns the scratch buffers and solver of one
/// worker. Create one per thread; the model itself is never mutated.
#[derive(Debug)]
pub struct ScoreTester<'a, S = SaddlePointSolver> {
    ctx: &'a ModelContext,
    buffers: ScoreBuffers,
    solver: S,
}

impl<'a> ScoreTester<'a> {
    pub fn new(ctx: &'a ModelContext) -> Self {
        Self::with_solver(ctx, SaddlePointSolver::default())
    }
}

impl<'a, S: TailProbabilitySolver> ScoreTester<'a, S> {
    pub fn with_solver(ctx: &'a ModelContext, solver: S) -> Self {
        Self {
            ctx,
            buffers: ScoreBuffers::for_model(ctx),
            solver,
        }
    }

    pub fn context(&self) -> &'a ModelContext {
        self.ctx
    }

    pub fn buffers(&self) -> &ScoreBuffers {
        &self.buffers
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }

    /// Quantitative test regardless of the model's trait type.
    pub fn test_quantitative(
        &mut self,
        dosage: &mut [f64],
    ) -> Result<Option<QuantitativeResult>, ScoreError> {
        quantitative::test(self.ctx, &mut self.buffers, dosage)
    }

    /// Binary test regardless of the model's trait type.
    pub fn test_binary(&mut self, dosage: &mut [f64]) -> Result<Option<BinaryResult>, ScoreError> {
        binary::test(self.ctx, &mut self.buffers, &self.solver, dosage)
    }

    /// Test one raw dosage vector with the model's trait type.
    ///
    /// `dosage` is imputed and possibly flipped in place. Variants failing
    /// the MAF/MAC gate give `Ok(None)`.
    pub fn test(&mut self, dosage: &mut [f64]) -> Result<Option<VariantResult>, ScoreError> {
        match self.ctx.trait_type() {
            TraitType::Quantitative => Ok(self
                .test_quantitative(dosage)?
                .map(VariantResult::Quantitative)),
            TraitType::Binary => Ok(self.test_binary(dosage)?.map(VariantResult::Binary)),
        }
    }
}
