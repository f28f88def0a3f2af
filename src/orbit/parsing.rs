use crate::orbit::OrbitError;

/// Split an element set into its optional name line and the two data lines.
pub fn parse_tle_lines(tle: &str) -> Result<(Option<String>, String, String), OrbitError> {
    let lines: Vec<String> = tle
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect();

    match lines.len() {
        2 => Ok((None, lines[0].clone(), lines[1].clone())),
        3 => Ok((Some(lines[0].clone()), lines[1].clone(), lines[2].clone())),
        n => Err(OrbitError::InvalidTleFormat(n)),
    }
}

/// Parse multi-satellite TLE content, mixing 2-line and 3-line records.
pub fn parse_multi_tle(content: &str) -> Vec<(Option<String>, String, String)> {
    let lines: Vec<&str> = content
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();

    let mut result = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        if lines[i].starts_with("1 ") && i + 1 < lines.len() && lines[i + 1].starts_with("2 ") {
            result.push((None, lines[i].to_string(), lines[i + 1].to_string()));
            i += 2;
        } else if i + 2 < lines.len()
            && lines[i + 1].starts_with("1 ")
            && lines[i + 2].starts_with("2 ")
        {
            result.push((
                Some(lines[i].to_string()),
                lines[i + 1].to_string(),
                lines[i + 2].to_string(),
            ));
            i += 3;
        } else {
            i += 1;
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINE1: &str = "1 25544U 98067A   24001.50000000  .00016717  00000-0  10270-3 0  9005";
    const LINE2: &str = "2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.50377579 12345";

    #[test]
    fn two_line_set_has_no_name() {
        let tle = format!("{LINE1}\n{LINE2}");
        let (name, l1, l2) = parse_tle_lines(&tle).unwrap();
        assert!(name.is_none());
        assert_eq!(l1, LINE1);
        assert_eq!(l2, LINE2);
    }

    #[test]
    fn three_line_set_keeps_name_and_ignores_blank_lines() {
        let tle = format!("\n  ISS (ZARYA)  \n\n{LINE1}\n{LINE2}\n\n");
        let (name, _, l2) = parse_tle_lines(&tle).unwrap();
        assert_eq!(name.as_deref(), Some("ISS (ZARYA)"));
        assert_eq!(l2, LINE2);
    }

    #[test]
    fn wrong_line_count_is_a_format_error() {
        assert!(matches!(
            parse_tle_lines(LINE1),
            Err(OrbitError::InvalidTleFormat(1))
        ));
        let four = format!("A\nB\n{LINE1}\n{LINE2}");
        assert!(matches!(
            parse_tle_lines(&four),
            Err(OrbitError::InvalidTleFormat(4))
        ));
        assert!(matches!(
            parse_tle_lines("   \n"),
            Err(OrbitError::InvalidTleFormat(0))
        ));
    }

    #[test]
    fn multi_tle_mixes_named_and_unnamed_records() {
        let content = format!("{LINE1}\n{LINE2}\nISS\n{LINE1}\n{LINE2}\ngarbage\n");
        let parsed = parse_multi_tle(&content);
        assert_eq!(parsed.len(), 2);
        assert!(parsed[0].0.is_none());
        assert_eq!(parsed[1].0.as_deref(), Some("ISS"));
    }
}
