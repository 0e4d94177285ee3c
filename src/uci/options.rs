//! UCI options: the engine-level settings plus every numeric search
//! parameter as a tunable spin.

use std::path::Path;

use crate::search::{SearchParams, SearchState};
use crate::tt::DEFAULT_TT_MB;

fn print_spin(
    name: &str,
    default: impl std::fmt::Display,
    min: impl std::fmt::Display,
    max: impl std::fmt::Display,
) {
    println!("option name {name} type spin default {default} min {min} max {max}");
}

fn print_check(name: &str, default: bool) {
    println!("option name {name} type check default {default}");
}

fn print_string(name: &str, default: &str) {
    println!("option name {name} type string default {default}");
}

/// Actions the controller must take after an option change.
pub enum OptionAction {
    ResizeHash(usize),
    ClearHash,
}

pub struct UciOptions {
    pub hash_mb: usize,
    pub threads: usize,
    pub multi_pv: u32,
    pub ponder: bool,
    pub move_overhead_ms: u64,
    pub chess960: bool,
    pub syzygy_path: String,
    pub book_file: String,
    pub eval_file: String,
}

impl Default for UciOptions {
    fn default() -> Self {
        UciOptions {
            hash_mb: DEFAULT_TT_MB,
            threads: 1,
            multi_pv: 1,
            ponder: false,
            move_overhead_ms: 10,
            chess960: false,
            syzygy_path: String::new(),
            book_file: String::new(),
            eval_file: String::new(),
        }
    }
}

/// One numeric search parameter exposed over UCI.
struct ParamSpin {
    name: &'static str,
    get: fn(&SearchParams) -> i32,
    set: fn(&mut SearchParams, i32),
    min: i32,
    max: i32,
}

macro_rules! param_spin {
    ($name:literal, $field:ident, $min:expr, $max:expr) => {
        ParamSpin {
            name: $name,
            get: |p| p.$field as i32,
            set: |p, v| p.$field = v as _,
            min: $min,
            max: $max,
        }
    };
}

const PARAM_SPINS: &[ParamSpin] = &[
    param_spin!("AspirationBase", aspiration_base, 4, 64),
    param_spin!("AspirationScoreDiv", aspiration_score_div, 8, 1024),
    param_spin!("AspirationGrowthDiv", aspiration_growth_div, 1, 16),
    param_spin!("AspirationGrowthAdd", aspiration_growth_add, 0, 32),
    param_spin!("RazorDepth", razor_depth, 1, 8),
    param_spin!("RazorBase", razor_base, 50, 800),
    param_spin!("RazorDepthMul", razor_depth_mul, 10, 300),
    param_spin!("RfpDepth", rfp_depth, 1, 16),
    param_spin!("RfpMargin", rfp_margin, 30, 300),
    param_spin!("NullMinDepth", null_min_depth, 1, 8),
    param_spin!("NullBaseReduction", null_base_reduction, 1, 6),
    param_spin!("NullDepthDiv", null_depth_div, 1, 12),
    param_spin!("NullEvalDiv", null_eval_div, 50, 800),
    param_spin!("NullVerifyDepth", null_verify_depth, 6, 24),
    param_spin!("ProbCutDepth", probcut_depth, 3, 12),
    param_spin!("ProbCutMargin", probcut_margin, 50, 500),
    param_spin!("IirMinDepth", iir_min_depth, 2, 12),
    param_spin!("SingularMinDepth", singular_min_depth, 4, 12),
    param_spin!("SingularMarginMul", singular_margin_mul, 1, 10),
    param_spin!("SingularDoubleMargin", singular_double_margin, 5, 100),
    param_spin!("LmrMinDepth", lmr_min_depth, 2, 6),
    param_spin!("LmrMoveThreshold", lmr_move_threshold, 1, 8),
    param_spin!("LmrStatDelta", lmr_stat_delta, 0, 16000),
    param_spin!("LmrHistDiv", lmr_hist_div, 1000, 32000),
    param_spin!("LmpBase", lmp_base, 1, 10),
    param_spin!("FutilityDepth", futility_depth, 1, 16),
    param_spin!("FutilityBase", futility_base, 20, 300),
    param_spin!("FutilityMargin", futility_margin, 50, 400),
    param_spin!("SeeQuietMul", see_quiet_mul, 10, 200),
    param_spin!("SeeCaptureMul", see_capture_mul, 50, 500),
    param_spin!("QsFutilityMargin", qs_futility_margin, 50, 400),
];

impl UciOptions {
    /// Print the `uci` handshake: identity, options, `uciok`.
    pub fn print(&self, params: &SearchParams) {
        println!("id name {} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        println!("id author rampart developers");

        print_spin("Hash", self.hash_mb, 1, 1 << 20);
        print_spin("Threads", self.threads, 1, 512);
        print_spin("MultiPV", self.multi_pv, 1, 256);
        print_check("Ponder", self.ponder);
        print_spin("Move Overhead", self.move_overhead_ms, 0, 5000);
        print_check("UCI_Chess960", self.chess960);
        print_string("SyzygyPath", "<empty>");
        print_string("BookFile", "<empty>");
        print_string("EvalFile", "<empty>");
        println!("option name Clear Hash type button");

        for spin in PARAM_SPINS {
            print_spin(spin.name, (spin.get)(params), spin.min, spin.max);
        }

        println!("uciok");
    }

    /// Apply a `setoption` command. Out-of-range values are rejected and
    /// the previous value kept. Only called while the engine is idle.
    pub fn apply(
        &mut self,
        name: &str,
        value: Option<&str>,
        state: &mut SearchState,
    ) -> Option<OptionAction> {
        let normalized = name.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "hash" => {
                if let Some(mb) = value.and_then(|v| v.parse::<usize>().ok()) {
                    if (1..=1 << 20).contains(&mb) && mb != self.hash_mb {
                        self.hash_mb = mb;
                        return Some(OptionAction::ResizeHash(mb));
                    }
                }
            }
            "threads" => {
                if let Some(threads) = value.and_then(|v| v.parse::<usize>().ok()) {
                    if (1..=512).contains(&threads) {
                        self.threads = threads;
                    }
                }
            }
            "multipv" => {
                if let Some(multi_pv) = value.and_then(|v| v.parse::<u32>().ok()) {
                    if (1..=256).contains(&multi_pv) {
                        self.multi_pv = multi_pv;
                    }
                }
            }
            "ponder" => {
                if let Some(v) = value {
                    self.ponder = v.trim().eq_ignore_ascii_case("true");
                }
            }
            "move overhead" => {
                if let Some(ms) = value.and_then(|v| v.parse::<u64>().ok()) {
                    if ms <= 5000 {
                        self.move_overhead_ms = ms;
                    }
                }
            }
            "uci_chess960" => {
                if let Some(v) = value {
                    self.chess960 = v.trim().eq_ignore_ascii_case("true");
                }
            }
            "syzygypath" => {
                self.syzygy_path = value.unwrap_or("").to_string();
            }
            "bookfile" => {
                self.book_file = value.unwrap_or("").to_string();
            }
            "evalfile" => {
                self.eval_file = value.unwrap_or("").to_string();
                if !self.eval_file.is_empty()
                    && self.eval_file != "<empty>"
                    && !Path::new(&self.eval_file).exists()
                {
                    eprintln!(
                        "info string EvalFile '{}' not found, using built-in evaluation",
                        self.eval_file
                    );
                    self.eval_file.clear();
                }
            }
            "clear hash" => {
                return Some(OptionAction::ClearHash);
            }
            _ => {
                // Numeric search parameters, matched case-insensitively.
                for spin in PARAM_SPINS {
                    if spin.name.eq_ignore_ascii_case(&normalized) {
                        if let Some(v) = value.and_then(|v| v.parse::<i32>().ok()) {
                            if (spin.min..=spin.max).contains(&v) {
                                (spin.set)(&mut state.params, v);
                            }
                        }
                        break;
                    }
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_hash_keeps_old_value() {
        let mut options = UciOptions::default();
        let mut state = SearchState::new(1);
        let action = options.apply("Hash", Some("99999999"), &mut state);
        assert!(action.is_none());
        assert_eq!(options.hash_mb, DEFAULT_TT_MB);
    }

    #[test]
    fn test_hash_resize_action() {
        let mut options = UciOptions::default();
        let mut state = SearchState::new(1);
        let action = options.apply("Hash", Some("128"), &mut state);
        assert!(matches!(action, Some(OptionAction::ResizeHash(128))));
        assert_eq!(options.hash_mb, 128);
    }

    #[test]
    fn test_param_spin_roundtrip() {
        let mut options = UciOptions::default();
        let mut state = SearchState::new(1);
        options.apply("RfpMargin", Some("150"), &mut state);
        assert_eq!(state.params.rfp_margin, 150);
        // Out of range: rejected.
        options.apply("RfpMargin", Some("10000"), &mut state);
        assert_eq!(state.params.rfp_margin, 150);
    }

    #[test]
    fn test_option_names_are_case_insensitive() {
        let mut options = UciOptions::default();
        let mut state = SearchState::new(1);
        options.apply("threads", Some("4"), &mut state);
        assert_eq!(options.threads, 4);
        options.apply("THREADS", Some("8"), &mut state);
        assert_eq!(options.threads, 8);
    }

    #[test]
    fn test_unknown_option_is_ignored() {
        let mut options = UciOptions::default();
        let mut state = SearchState::new(1);
        assert!(options.apply("NoSuchOption", Some("1"), &mut state).is_none());
    }

    #[test]
    fn test_missing_eval_file_falls_back() {
        let mut options = UciOptions::default();
        let mut state = SearchState::new(1);
        options.apply("EvalFile", Some("/no/such/net.nnue"), &mut state);
        assert!(options.eval_file.is_empty());
    }
}
