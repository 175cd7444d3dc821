//! Sliding-window aggregation over a daily close series.

use thiserror::Error;

pub type Window = Vec<f64>;

#[derive(Debug, Error)]
pub enum WindowError {
    #[error("timesteps must be greater than zero")]
    InvalidTimesteps,
    #[error("window {index} has {found} values, expected {expected}")]
    WindowLength {
        index: usize,
        found: usize,
        expected: usize,
    },
}

pub fn aggregate_data_in_timesteps(
    data: &[f64],
    timesteps: usize,
) -> Result<Vec<Window>, WindowError> {
    if timesteps == 0 {
        return Err(WindowError::InvalidTimesteps);
    }
    if data.len() < timesteps {
        return Ok(Vec::new());
    }

    let mut windows = Vec::with_capacity(data.len() - timesteps + 1);
    for offset in 0..=data.len() - timesteps {
        windows.push(data[offset..offset + timesteps].to_vec());
    }
    Ok(windows)
}

// Features are the first timesteps - 1 values of each window, the target is
// the final value. A window of any other length fails loudly.
pub fn split_x_y(
    windows: &[Window],
    timesteps: usize,
) -> Result<(Vec<Vec<f64>>, Vec<Vec<f64>>), WindowError> {
    if timesteps == 0 {
        return Err(WindowError::InvalidTimesteps);
    }

    let mut features = Vec::with_capacity(windows.len());
    let mut targets = Vec::with_capacity(windows.len());
    for (index, window) in windows.iter().enumerate() {
        if window.len() != timesteps {
            return Err(WindowError::WindowLength {
                index,
                found: window.len(),
                expected: timesteps,
            });
        }
        features.push(window[..timesteps - 1].to_vec());
        targets.push(vec![window[timesteps - 1]]);
    }
    Ok((features, targets))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_timesteps_is_rejected_by_both_operations() {
        assert!(matches!(
            aggregate_data_in_timesteps(&[1.0, 2.0], 0).unwrap_err(),
            WindowError::InvalidTimesteps
        ));
        assert!(matches!(
            split_x_y(&[vec![1.0]], 0).unwrap_err(),
            WindowError::InvalidTimesteps
        ));
    }

    #[test]
    fn input_shorter_than_timesteps_yields_no_windows() {
        let windows = aggregate_data_in_timesteps(&[1.0, 2.0], 3).unwrap();
        assert!(windows.is_empty());

        let windows = aggregate_data_in_timesteps(&[], 3).unwrap();
        assert!(windows.is_empty());
    }

    #[test]
    fn input_of_exact_length_yields_one_window() {
        let windows = aggregate_data_in_timesteps(&[1.5, 2.5, 3.5], 3).unwrap();
        assert_eq!(windows, vec![vec![1.5, 2.5, 3.5]]);
    }

    #[test]
    fn ragged_window_fails_with_its_index_and_lengths() {
        let windows = vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0]];
        let err = split_x_y(&windows, 3).unwrap_err();
        assert!(matches!(
            err,
            WindowError::WindowLength {
                index: 1,
                found: 2,
                expected: 3,
            }
        ));
    }

    #[test]
    fn single_timestep_splits_into_empty_features_and_the_value() {
        let windows = aggregate_data_in_timesteps(&[9.0, 8.0], 1).unwrap();
        assert_eq!(windows, vec![vec![9.0], vec![8.0]]);

        let (features, targets) = split_x_y(&windows, 1).unwrap();
        assert_eq!(features, vec![Vec::<f64>::new(), Vec::<f64>::new()]);
        assert_eq!(targets, vec![vec![9.0], vec![8.0]]);
    }
}
