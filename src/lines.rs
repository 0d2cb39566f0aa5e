//! Line codes and names for MBTA routes.
//!
//! Three spellings of the same route show up along the way:
//! the MBTA route id (`Green-B`, `Red`, `CR-Fitchburg`, `741`), the short
//! line code the commute server emits (`B`, `RL`, `CR-Fitchburg`, `741`),
//! and the rider-facing name shown in the detail view (`Green Line B`).

const GREEN_FAMILY_PREFIX: &str = "Green-";
const LINE_SEPARATOR: char = '-';

/// Maps an MBTA route id to the short line code sent to clients.
pub fn line_code(route_id: &str) -> String {
    if route_id.starts_with("Red") {
        "RL".to_string()
    } else if route_id.starts_with("Green") {
        match route_id.split(LINE_SEPARATOR).nth(1) {
            Some(branch) => branch.to_string(),
            None => "GL".to_string(),
        }
    } else if route_id.starts_with("Blue") {
        "BL".to_string()
    } else if route_id.starts_with("Orange") {
        "OL".to_string()
    } else if route_id.starts_with("Silver") {
        "SL".to_string()
    } else {
        route_id.to_string()
    }
}

/// Collapses sub-branches of one line to the label drawn on a card.
///
/// `Green-` is stripped outright, anything else keeps the text before the
/// first separator, so `CR-Fitchburg` and `CR-Lowell` both read `CR`.
pub fn display_line(line: &str) -> &str {
    if let Some(branch) = line.strip_prefix(GREEN_FAMILY_PREFIX) {
        branch
    } else if let Some((family, _)) = line.split_once(LINE_SEPARATOR) {
        family
    } else {
        line
    }
}

/// Human name for a line code, used by the detail view.
pub fn full_line_name(line: &str) -> String {
    match line {
        "RL" => "Red Line".to_string(),
        "OL" => "Orange Line".to_string(),
        "BL" => "Blue Line".to_string(),
        "GL" => "Green Line".to_string(),
        "A" | "B" | "C" | "D" | "E" => format!("Green Line {}", line),
        _ => {
            if let Some(variant) = line.strip_prefix("SL") {
                format!("Silver Line {}", variant)
            } else if let Some(name) = line.strip_prefix("CR-") {
                format!("{} Line", name)
            } else {
                format!("Bus {}", line)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_code_for_rapid_transit() {
        assert_eq!(line_code("Red"), "RL");
        assert_eq!(line_code("Orange"), "OL");
        assert_eq!(line_code("Blue"), "BL");
        assert_eq!(line_code("Green-B"), "B");
        assert_eq!(line_code("Green"), "GL");
        assert_eq!(line_code("Silver"), "SL");
    }

    #[test]
    fn test_line_code_passes_other_routes_through() {
        assert_eq!(line_code("741"), "741");
        assert_eq!(line_code("CR-Fitchburg"), "CR-Fitchburg");
    }

    #[test]
    fn test_display_line_collapses_branches() {
        assert_eq!(display_line("Green-E"), "E");
        assert_eq!(display_line("CR-Fitchburg"), "CR");
        assert_eq!(display_line("RL"), "RL");
        assert_eq!(display_line("SL1"), "SL1");
    }

    #[test]
    fn test_full_line_name() {
        assert_eq!(full_line_name("RL"), "Red Line");
        assert_eq!(full_line_name("GL"), "Green Line");
        assert_eq!(full_line_name("D"), "Green Line D");
        assert_eq!(full_line_name("SL4"), "Silver Line 4");
        assert_eq!(full_line_name("SL"), "Silver Line ");
        assert_eq!(full_line_name("CR-Worcester"), "Worcester Line");
        assert_eq!(full_line_name("39"), "Bus 39");
    }
}
