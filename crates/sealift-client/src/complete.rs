use sealift_common::error::{Result, SealiftError};
use sealift_common::types::CompletedPart;

/// Checks the finalize preconditions from local state alone, and sorts the
/// parts ascending as the store's completion call requires. Any violation
/// here means the network finalize must not be attempted at all.
pub fn validate_part_set(parts: &mut [CompletedPart], expected: usize) -> Result<()> {
    if parts.len() != expected {
        return Err(SealiftError::PartSetIncomplete(format!(
            "have {} parts, expected {expected}",
            parts.len()
        )));
    }

    parts.sort_by_key(|part| part.part_number);

    for (i, part) in parts.iter().enumerate() {
        let expected_number = i as i32 + 1;
        if part.part_number != expected_number {
            let detail = if i > 0 && parts[i - 1].part_number == part.part_number {
                format!("duplicate part {}", part.part_number)
            } else {
                format!("missing part {expected_number}")
            };
            return Err(SealiftError::PartSetIncomplete(detail));
        }
        if part.etag.is_empty() {
            return Err(SealiftError::PartSetIncomplete(format!(
                "part {} has no etag",
                part.part_number
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use sealift_common::error::SealiftError;
    use sealift_common::types::CompletedPart;

    use super::validate_part_set;

    fn part(number: i32) -> CompletedPart {
        CompletedPart {
            part_number: number,
            etag: format!("\"etag-{number}\""),
        }
    }

    #[test]
    fn sorts_an_out_of_order_but_complete_set() {
        let mut parts = vec![part(3), part(1), part(2)];
        validate_part_set(&mut parts, 3).unwrap();
        let numbers: Vec<i32> = parts.iter().map(|p| p.part_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[test]
    fn missing_part_blocks_completion() {
        let mut parts = vec![part(1), part(3)];
        assert!(matches!(
            validate_part_set(&mut parts, 3),
            Err(SealiftError::PartSetIncomplete(_))
        ));
    }

    #[test]
    fn duplicate_part_blocks_completion() {
        let mut parts = vec![part(1), part(2), part(2)];
        let err = validate_part_set(&mut parts, 3).unwrap_err();
        assert!(err.to_string().contains("duplicate part 2"));
    }

    #[test]
    fn empty_etag_blocks_completion() {
        let mut parts = vec![
            part(1),
            CompletedPart {
                part_number: 2,
                etag: String::new(),
            },
        ];
        assert!(validate_part_set(&mut parts, 2).is_err());
    }

    #[test]
    fn empty_set_with_zero_expected_passes() {
        let mut parts: Vec<CompletedPart> = Vec::new();
        validate_part_set(&mut parts, 0).unwrap();
    }
}
