//! UCI command parsing.

use crate::search::SearchLimits;

#[derive(Debug, Clone)]
pub enum UciCommand {
    Uci,
    IsReady,
    UciNewGame,
    Position(Vec<String>),
    Go(Vec<String>),
    Perft(usize),
    SetOption(Vec<String>),
    Debug(Option<String>),
    Display,
    Stop,
    PonderHit,
    Quit,
    Unknown(String),
}

/// Parse the token after `parts[i]` as a `T`.
#[inline]
fn parse_next<T: std::str::FromStr>(parts: &[&str], i: usize) -> Option<T> {
    parts.get(i + 1).and_then(|v| v.parse::<T>().ok())
}

/// Parse the tail of a `go` command into search limits.
#[must_use]
pub fn parse_go_limits(parts: &[&str]) -> SearchLimits {
    let mut limits = SearchLimits::default();
    let mut i = 1;

    while i < parts.len() {
        let consumed = match parts[i] {
            "wtime" => {
                limits.time[0] = parse_next(parts, i);
                2
            }
            "btime" => {
                limits.time[1] = parse_next(parts, i);
                2
            }
            "winc" => {
                limits.inc[0] = parse_next(parts, i).unwrap_or(0);
                2
            }
            "binc" => {
                limits.inc[1] = parse_next(parts, i).unwrap_or(0);
                2
            }
            "movestogo" => {
                limits.movestogo = parse_next(parts, i);
                2
            }
            "movetime" => {
                limits.movetime = parse_next(parts, i);
                2
            }
            "depth" => {
                limits.depth = parse_next(parts, i);
                2
            }
            "nodes" => {
                limits.nodes = parse_next(parts, i);
                2
            }
            "mate" => {
                limits.mate = parse_next(parts, i);
                2
            }
            "infinite" => {
                limits.infinite = true;
                1
            }
            "ponder" => {
                limits.ponder = true;
                1
            }
            // Unknown tokens are skipped silently.
            _ => 1,
        };
        i += consumed;
    }
    limits
}

/// Split a `setoption name <N> value <V>` line into name and value.
#[must_use]
pub fn parse_setoption(parts: &[&str]) -> Option<(String, Option<String>)> {
    let mut name_parts: Vec<&str> = Vec::new();
    let mut value_parts: Vec<&str> = Vec::new();
    let mut mode = "";

    for part in parts.iter().skip(1) {
        match *part {
            "name" => mode = "name",
            "value" => mode = "value",
            _ => match mode {
                "name" => name_parts.push(part),
                "value" => value_parts.push(part),
                _ => {}
            },
        }
    }

    if name_parts.is_empty() {
        return None;
    }
    let value = if value_parts.is_empty() {
        None
    } else {
        Some(value_parts.join(" "))
    };
    Some((name_parts.join(" "), value))
}

#[must_use]
pub fn parse_command(line: &str) -> Option<UciCommand> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    let parts: Vec<&str> = trimmed.split_whitespace().collect();

    let owned = || parts.iter().map(|p| (*p).to_string()).collect::<Vec<_>>();

    let cmd = match parts[0] {
        "uci" => UciCommand::Uci,
        "isready" => UciCommand::IsReady,
        "ucinewgame" => UciCommand::UciNewGame,
        "position" => UciCommand::Position(owned()),
        "go" => UciCommand::Go(owned()),
        "perft" => {
            let depth = parts.get(1).and_then(|v| v.parse().ok()).unwrap_or(1);
            UciCommand::Perft(depth)
        }
        "setoption" => UciCommand::SetOption(owned()),
        "debug" => UciCommand::Debug(parts.get(1).map(|v| (*v).to_string())),
        "d" | "display" => UciCommand::Display,
        "stop" => UciCommand::Stop,
        "ponderhit" => UciCommand::PonderHit,
        "quit" => UciCommand::Quit,
        _ => UciCommand::Unknown(trimmed.to_string()),
    };
    Some(cmd)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_commands() {
        assert!(matches!(parse_command("uci"), Some(UciCommand::Uci)));
        assert!(matches!(parse_command("isready"), Some(UciCommand::IsReady)));
        assert!(matches!(parse_command("stop"), Some(UciCommand::Stop)));
        assert!(matches!(parse_command("quit"), Some(UciCommand::Quit)));
        assert!(parse_command("   ").is_none());
        assert!(matches!(
            parse_command("flurble"),
            Some(UciCommand::Unknown(_))
        ));
    }

    #[test]
    fn test_parse_go_limits() {
        let parts: Vec<&str> = "go wtime 1000 btime 2000 winc 10 binc 20 movestogo 5"
            .split_whitespace()
            .collect();
        let limits = parse_go_limits(&parts);
        assert_eq!(limits.time, [Some(1000), Some(2000)]);
        assert_eq!(limits.inc, [10, 20]);
        assert_eq!(limits.movestogo, Some(5));

        let parts: Vec<&str> = "go depth 9".split_whitespace().collect();
        assert_eq!(parse_go_limits(&parts).depth, Some(9));

        let parts: Vec<&str> = "go infinite".split_whitespace().collect();
        assert!(parse_go_limits(&parts).infinite);
    }

    #[test]
    fn test_parse_go_ignores_junk() {
        let parts: Vec<&str> = "go fishsticks depth 3".split_whitespace().collect();
        assert_eq!(parse_go_limits(&parts).depth, Some(3));
    }

    #[test]
    fn test_parse_setoption() {
        let parts: Vec<&str> = "setoption name Hash value 128".split_whitespace().collect();
        assert_eq!(
            parse_setoption(&parts),
            Some(("Hash".to_string(), Some("128".to_string())))
        );

        let parts: Vec<&str> = "setoption name Move Overhead value 30"
            .split_whitespace()
            .collect();
        assert_eq!(
            parse_setoption(&parts),
            Some(("Move Overhead".to_string(), Some("30".to_string())))
        );

        let parts: Vec<&str> = "setoption name Clear Hash".split_whitespace().collect();
        assert_eq!(parse_setoption(&parts), Some(("Clear Hash".to_string(), None)));

        let parts: Vec<&str> = "setoption".split_whitespace().collect();
        assert_eq!(parse_setoption(&parts), None);
    }
}
