//! missing_data::listwise — drop incomplete observations.
use ndarray::{Array2, Axis};

/// Copy `data` without the rows that contain a NaN.
///
/// Returns `None` when every row has at least one NaN (or there are no
/// rows). The input is left untouched.
pub fn listwise_delete(data: &Array2<f64>) -> Option<Array2<f64>> {
    let keep: Vec<usize> = data
        .outer_iter()
        .enumerate()
        .filter(|(_, row)| row.iter().all(|x| !x.is_nan()))
        .map(|(i, _)| i)
        .collect();
    if keep.is_empty() {
        return None;
    }
    Some(data.select(Axis(0), &keep))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // Rows with a NaN anywhere are removed; complete rows keep their order.
    //
    // Given
    // -----
    // - A 4×2 matrix whose rows 1 and 3 contain NaN.
    //
    // Expect
    // ------
    // - Rows 0 and 2, in that order.
    fn listwise_delete_drops_incomplete_rows() {
        let data = array![[1.0, 2.0], [f64::NAN, 3.0], [4.0, 5.0], [6.0, f64::NAN]];

        let kept = listwise_delete(&data).unwrap();

        assert_eq!(kept, array![[1.0, 2.0], [4.0, 5.0]]);
    }

    #[test]
    // Purpose
    // -------
    // No surviving row yields `None`.
    //
    // Given
    // -----
    // - Every row contains a NaN.
    //
    // Expect
    // ------
    // - `None`.
    fn listwise_delete_returns_none_when_nothing_survives() {
        let data = array![[f64::NAN, 1.0], [2.0, f64::NAN]];

        assert!(listwise_delete(&data).is_none());
    }
}
