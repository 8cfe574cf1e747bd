use crate::support::{
    FAILURE_SAMPLE_LIMIT, Settings, load_hierarchy, load_settings, or_exit,
    parse_strictness_or_exit, print_sample_block, sample_with_truncation, yes_no,
};
use methodmeta_kernel::{
    AggregationConfig, AggregationReport, AggregationResults, ConfigurationError,
    MetadataAggregator, MethodMetadata, MethodSignature,
};
use serde_json::json;
use std::collections::BTreeMap;
use std::path::Path;
use std::process;
use std::sync::Arc;
use tokio::task::JoinSet;

pub struct Args {
    pub hierarchy: String,
    pub config: Option<String>,
    pub strictness: Option<String>,
    pub jobs: Option<usize>,
    pub json: bool,
}

type Outcome = (
    MethodSignature,
    Result<MethodMetadata, ConfigurationError>,
    Vec<ConfigurationError>,
);

pub fn run(args: Args) {
    let settings = match &args.config {
        Some(path) => or_exit(load_settings(Path::new(path))),
        None => Settings::default(),
    };
    let strictness = match &args.strictness {
        Some(level) => parse_strictness_or_exit(level),
        None => settings.strictness.unwrap_or_default(),
    };
    let jobs = args.jobs.or(settings.jobs).map(|n| n.max(1));

    let hierarchy_path = Path::new(&args.hierarchy);
    let document = or_exit(load_hierarchy(hierarchy_path));
    let subtypes = document.subtype_table();
    let sites_per_method = or_exit(document.into_sites().map_err(Into::into));

    let aggregator = MetadataAggregator::new(AggregationConfig { strictness })
        .with_type_relation(Arc::new(subtypes));
    tracing::debug!(
        methods = sites_per_method.len(),
        %strictness,
        jobs = ?jobs,
        "aggregating hierarchy"
    );

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    if let Some(jobs) = jobs {
        builder.worker_threads(jobs).max_blocking_threads(jobs);
    }
    let runtime = builder.enable_all().build().unwrap_or_else(|e| {
        eprintln!("error: failed to create tokio runtime: {e}");
        process::exit(2);
    });

    let outcomes = runtime.block_on(async move {
        let mut tasks = JoinSet::new();
        for (method, sites) in sites_per_method {
            let aggregator = aggregator.clone();
            tasks.spawn_blocking(move || -> Outcome {
                let outcome = aggregator.aggregate_method(&method, &sites);
                let violations = if outcome.is_err() {
                    aggregator.diagnose_method(&method, &sites)
                } else {
                    Vec::new()
                };
                (method, outcome, violations)
            });
        }

        let mut outcomes = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    eprintln!("error: aggregation task failed: {e}");
                    process::exit(2);
                }
            }
        }
        outcomes
    });

    let mut results = AggregationResults::new();
    let mut violations: BTreeMap<String, Vec<ConfigurationError>> = BTreeMap::new();
    for (method, outcome, found) in outcomes {
        if !found.is_empty() {
            violations.insert(method.to_string(), found);
        }
        results.insert(method, outcome);
    }
    let report = AggregationReport::from_results(&results);

    if args.json {
        let payload = json!({
            "strictness": strictness.to_string(),
            "source": hierarchy_path.display().to_string(),
            "clean": report.is_clean(),
            "report": report,
            "failuresByKind": report
                .failures_by_kind()
                .into_iter()
                .map(|(kind, count)| (kind.to_string(), count))
                .collect::<BTreeMap<_, _>>(),
            "violations": violations,
        });
        let rendered = serde_json::to_string_pretty(&payload).unwrap_or_else(|err| {
            eprintln!("error: failed to render aggregate json: {err}");
            process::exit(2);
        });
        println!("{rendered}");
    } else {
        println!("methodmeta aggregate {} --strictness {strictness}", args.hierarchy);
        println!("  Methods: {}", report.method_count);
        println!("  Published: {}", report.published_count);
        println!("  Failed: {}", report.failed_count);
        println!("  Clean: {}", yes_no(report.is_clean()));
        for (kind, count) in report.failures_by_kind() {
            println!("  {kind}: {count}");
        }

        let failures: Vec<String> = report
            .methods
            .iter()
            .filter_map(|m| m.error.as_ref().map(ToString::to_string))
            .collect();
        let (failures, truncated) = sample_with_truncation(failures, FAILURE_SAMPLE_LIMIT);
        print_sample_block("Failures", &failures, truncated);
    }

    if !report.is_clean() {
        process::exit(1);
    }
}
