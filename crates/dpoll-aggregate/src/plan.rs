//! Which tables to compute.

use dpoll_model::{AnalysisOptions, DistributionRequest, Metadata, TableRequest, WeightSpec};

/// Weights to compute tables under: "Unweighted" first when enabled, then
/// every selected weight variable in declaration order.
pub fn weight_specs(metadata: &Metadata, options: &AnalysisOptions) -> Vec<WeightSpec> {
    let mut weights = Vec::new();
    if options.include_unweighted {
        weights.push(WeightSpec::Unweighted);
    }
    weights.extend(
        metadata
            .weights()
            .into_iter()
            .filter(|v| options.uses_weight(&v.name))
            .map(|v| WeightSpec::Variable(v.name.clone())),
    );
    weights
}

/// Every ordinal variable × (no breakdown, then each nominal variable) ×
/// every weight, in declaration order.
pub fn plan_tables(metadata: &Metadata, options: &AnalysisOptions) -> Vec<TableRequest> {
    let weights = weight_specs(metadata, options);
    let mut breakdowns: Vec<Option<String>> = vec![None];
    breakdowns.extend(metadata.nominals().into_iter().map(|v| Some(v.name.clone())));

    let mut requests = Vec::new();
    for ordinal in metadata.ordinals() {
        for breakdown in &breakdowns {
            for weight in &weights {
                requests.push(TableRequest::new(
                    ordinal.name.clone(),
                    breakdown.clone(),
                    weight.clone(),
                ));
            }
        }
    }
    requests
}

/// Every nominal variable × every weight, in declaration order.
pub fn plan_distributions(
    metadata: &Metadata,
    options: &AnalysisOptions,
) -> Vec<DistributionRequest> {
    let weights = weight_specs(metadata, options);
    metadata
        .nominals()
        .into_iter()
        .flat_map(|nominal| {
            weights
                .iter()
                .map(|weight| DistributionRequest::new(nominal.name.clone(), weight.clone()))
        })
        .collect()
}

/// Display label of a weight: "Unweighted" or the variable's label.
pub fn weight_label(metadata: &Metadata, weight: &WeightSpec) -> String {
    match weight {
        WeightSpec::Unweighted => "Unweighted".to_string(),
        WeightSpec::Variable(name) => metadata
            .variable(name)
            .map_or_else(|| name.clone(), |v| v.display_label().to_string()),
    }
}
