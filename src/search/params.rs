//! Tunable search parameters.
//!
//! Every field is exposed as a UCI spin option so the values can be tuned
//! externally. Options are applied while the engine is idle; during a
//! search the struct is read-only and shared by reference with every
//! worker.

#[derive(Clone, Debug)]
pub struct SearchParams {
    // Aspiration windows.
    pub aspiration_base: i32,
    pub aspiration_score_div: i32,
    pub aspiration_growth_div: i32,
    pub aspiration_growth_add: i32,

    // Razoring.
    pub razor_depth: i32,
    pub razor_base: i32,
    pub razor_depth_mul: i32,

    // Reverse futility pruning.
    pub rfp_depth: i32,
    pub rfp_margin: i32,

    // Null-move pruning.
    pub null_min_depth: i32,
    pub null_base_reduction: i32,
    pub null_depth_div: i32,
    pub null_eval_div: i32,
    pub null_verify_depth: i32,

    // ProbCut.
    pub probcut_depth: i32,
    pub probcut_margin: i32,

    // Internal iterative reductions.
    pub iir_min_depth: i32,

    // Singular extensions.
    pub singular_min_depth: i32,
    pub singular_margin_mul: i32,
    pub singular_double_margin: i32,

    // Late-move reductions.
    pub lmr_min_depth: i32,
    pub lmr_move_threshold: usize,
    pub lmr_stat_delta: i32,
    pub lmr_hist_div: i32,

    // Move-loop pruning.
    pub lmp_base: i32,
    pub futility_depth: i32,
    pub futility_base: i32,
    pub futility_margin: i32,
    pub see_quiet_mul: i32,
    pub see_capture_mul: i32,

    // Quiescence.
    pub qs_futility_margin: i32,
}

impl Default for SearchParams {
    fn default() -> Self {
        SearchParams {
            aspiration_base: 12,
            aspiration_score_div: 64,
            aspiration_growth_div: 4,
            aspiration_growth_add: 2,

            razor_depth: 3,
            razor_base: 250,
            razor_depth_mul: 60,

            rfp_depth: 8,
            rfp_margin: 100,

            null_min_depth: 3,
            null_base_reduction: 3,
            null_depth_div: 4,
            null_eval_div: 200,
            null_verify_depth: 12,

            probcut_depth: 5,
            probcut_margin: 180,

            iir_min_depth: 4,

            singular_min_depth: 7,
            singular_margin_mul: 3,
            singular_double_margin: 20,

            lmr_min_depth: 3,
            lmr_move_threshold: 2,
            lmr_stat_delta: 4000,
            lmr_hist_div: 8000,

            lmp_base: 3,
            futility_depth: 8,
            futility_base: 100,
            futility_margin: 150,
            see_quiet_mul: 50,
            see_capture_mul: 180,

            qs_futility_margin: 155,
        }
    }
}

impl SearchParams {
    /// Late-move-pruning threshold: beyond this many moves quiet moves are
    /// skipped at shallow depth.
    #[inline]
    #[must_use]
    pub(crate) fn lmp_threshold(&self, depth: i32, improving: bool) -> usize {
        let count = (self.lmp_base + depth * depth) / if improving { 1 } else { 2 };
        count.max(1) as usize
    }
}
