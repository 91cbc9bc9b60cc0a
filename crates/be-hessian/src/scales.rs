use be_core::Error;

/// Spacing of generated scales between a minimum and maximum sigma.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SigmaStepMethod {
    #[default]
    Equispaced,
    Logarithmic,
}

/// `steps` sigmas from `min` to `max` inclusive. A single step yields `[min]`.
pub fn sigma_array(
    min: f64,
    max: f64,
    steps: usize,
    method: SigmaStepMethod,
) -> Result<Vec<f64>, Error> {
    check_sigma(min)?;
    check_sigma(max)?;
    if steps == 0 {
        return Err(Error::EmptyScales);
    }
    if max < min {
        return Err(Error::InvalidParameter {
            name: "max_sigma",
            value: max,
        });
    }
    if steps == 1 {
        return Ok(vec![min]);
    }

    let last = (steps - 1) as f64;
    let sigmas = match method {
        SigmaStepMethod::Equispaced => {
            let step = (max - min) / last;
            (0..steps).map(|i| min + step * i as f64).collect()
        }
        SigmaStepMethod::Logarithmic => {
            let (lo, hi) = (min.ln(), max.ln());
            let step = (hi - lo) / last;
            (0..steps).map(|i| (lo + step * i as f64).exp()).collect()
        }
    };

    Ok(sigmas)
}

/// Checks a caller-supplied scale list.
pub fn validate_sigmas(sigmas: &[f64]) -> Result<(), Error> {
    if sigmas.is_empty() {
        return Err(Error::EmptyScales);
    }
    sigmas.iter().try_for_each(|&s| check_sigma(s))
}

fn check_sigma(sigma: f64) -> Result<(), Error> {
    if sigma.is_finite() && sigma > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidScale(sigma))
    }
}
