use simmesh_model::DistributionTag;

/// Introspection record describing a distribution's parameters, for
/// model-validation diagnostics and the `--describe-distributions` CLI flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DistributionInfo {
    /// Distribution tag this record describes.
    pub tag: DistributionTag,
    /// Human-readable display name.
    pub display_name: &'static str,
    /// Parameter names that must be present.
    pub required_params: &'static [&'static str],
    /// Parameter names that may optionally replace a required one
    /// (currently only `exponential`'s `lambda`/`scale` pair).
    pub optional_params: &'static [&'static str],
    /// One-line description.
    pub description: &'static str,
    /// Example parameter map, as written in a `[VARIABLES]` line.
    pub example: &'static str,
}

/// Reports the required/optional parameter names for `tag`.
pub fn distribution_info(tag: DistributionTag) -> DistributionInfo {
    match tag {
        DistributionTag::Normal => DistributionInfo {
            tag,
            display_name: "Normal (Gaussian)",
            required_params: &["media", "std"],
            optional_params: &[],
            description: "Symmetric bell curve parameterized by mean and standard deviation",
            example: "media=0, std=1",
        },
        DistributionTag::Uniform => DistributionInfo {
            tag,
            display_name: "Uniform",
            required_params: &["min", "max"],
            optional_params: &[],
            description: "Constant density on [min, max]",
            example: "min=0, max=10",
        },
        DistributionTag::Exponential => DistributionInfo {
            tag,
            display_name: "Exponential",
            required_params: &[],
            optional_params: &["lambda", "scale"],
            description: "Time between events; accepts rate (lambda) or scale = 1/lambda",
            example: "lambda=1.5",
        },
        DistributionTag::Lognormal => DistributionInfo {
            tag,
            display_name: "Log-normal",
            required_params: &["mu", "sigma"],
            optional_params: &[],
            description: "Distribution whose logarithm is normal(mu, sigma)",
            example: "mu=0, sigma=0.5",
        },
        DistributionTag::Triangular => DistributionInfo {
            tag,
            display_name: "Triangular",
            required_params: &["left", "mode", "right"],
            optional_params: &[],
            description: "Piecewise-linear density peaking at mode, on [left, right]",
            example: "left=0, mode=3, right=10",
        },
        DistributionTag::Binomial => DistributionInfo {
            tag,
            display_name: "Binomial",
            required_params: &["n", "p"],
            optional_params: &[],
            description: "Number of successes in n independent trials with success probability p",
            example: "n=10, p=0.5",
        },
    }
}

/// Returns [`distribution_info`] for every supported tag, in a stable order.
pub fn all_distribution_info() -> Vec<DistributionInfo> {
    [
        DistributionTag::Normal,
        DistributionTag::Uniform,
        DistributionTag::Exponential,
        DistributionTag::Lognormal,
        DistributionTag::Triangular,
        DistributionTag::Binomial,
    ]
    .into_iter()
    .map(distribution_info)
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_tag_has_info() {
        assert_eq!(all_distribution_info().len(), 6);
    }

    #[test]
    fn exponential_has_no_required_params_but_two_optional() {
        let info = distribution_info(DistributionTag::Exponential);
        assert!(info.required_params.is_empty());
        assert_eq!(info.optional_params.len(), 2);
    }
}
