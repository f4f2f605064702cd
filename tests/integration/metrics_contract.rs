#![allow(missing_docs)]

use incgraph::census::Graphlet;
use incgraph::data_generator::DataGenerator;
use incgraph::{EngineConfig, GraphletError, MetricRegistry, NodeRegistry, TopologyMetric};

fn all_metrics(config: &EngineConfig) -> Vec<Box<dyn TopologyMetric>> {
    MetricRegistry::names()
        .map(|name| MetricRegistry::create(name, config).unwrap())
        .collect()
}

#[test]
fn metrics_refuse_work_before_update() {
    for mut metric in all_metrics(&EngineConfig::default()) {
        assert!(matches!(metric.value(), Err(GraphletError::NotInitialized(_))));
        assert!(metric.revert().is_err(), "{}", metric.name());
    }
}

#[test]
fn incremental_values_match_fresh_updates() {
    let config = EngineConfig::default();
    let mut generator = DataGenerator::new(11);
    let mut graph = generator.graph(NodeRegistry::shared(), 14, 40).unwrap();
    let mut metrics = all_metrics(&config);
    for metric in &mut metrics {
        metric.update(&graph).unwrap();
    }

    for round in 0..8 {
        *graph.staged_mut() = generator.batch(&graph, 4, 4, 1);
        let expected = graph.materialize(graph.staged()).unwrap();
        for metric in &mut metrics {
            let mut batch = graph.staged().clone();
            metric.incremental_update(&graph, &mut batch).unwrap();
            let mut fresh = MetricRegistry::create(metric.name(), &config).unwrap();
            fresh.update(&expected).unwrap();
            let (got, want) = (metric.value().unwrap(), fresh.value().unwrap());
            assert!(
                (got - want).abs() < 1e-12,
                "{} round {round}: {got} != {want}",
                metric.name()
            );
        }
        if round % 2 == 0 {
            for metric in &mut metrics {
                metric.revert().unwrap();
            }
            graph.revert().unwrap();
        } else {
            graph.commit().unwrap();
        }
    }
}

#[test]
fn revert_restores_values() {
    let config = EngineConfig::default();
    let mut generator = DataGenerator::new(5);
    let mut graph = generator.graph(NodeRegistry::shared(), 8, 16).unwrap();
    for mut metric in all_metrics(&config) {
        metric.update(&graph).unwrap();
        let before = metric.value().unwrap();
        *graph.staged_mut() = generator.batch(&graph, 3, 3, 2);
        metric.apply_staged(&mut graph).unwrap();
        metric.revert().unwrap();
        graph.revert().unwrap();
        assert_eq!(metric.value().unwrap(), before, "{}", metric.name());
        assert!(metric.revert().is_err());
    }
}

#[test]
fn census_value_follows_the_configured_graphlet() {
    let mut config = EngineConfig::default();
    config.census.penalized_graphlet = Graphlet::OpenTriad;
    let (graph, _) = incgraph::load_pairs(NodeRegistry::shared(), [("a", "b"), ("b", "c")]).unwrap();
    let mut census = MetricRegistry::create("graphlet-census", &config).unwrap();
    census.update(&graph).unwrap();
    assert_eq!(census.value().unwrap(), 1.0);

    config.metrics.enabled = vec!["max-fan-out".into(), "nope".into()];
    assert!(matches!(
        MetricRegistry::create_enabled(&config),
        Err(GraphletError::UnknownMetric(name)) if name == "nope"
    ));
}
