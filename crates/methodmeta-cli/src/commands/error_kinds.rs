use methodmeta_kernel::ConfigurationErrorKind;
use serde_json::{Value, json};

const KINDS: [(ConfigurationErrorKind, &str); 5] = [
    (
        ConfigurationErrorKind::IncompatibleSignature,
        "declaration sites disagree on arity, parameter erasure or return assignability",
    ),
    (
        ConfigurationErrorKind::ParameterConstraintStrengthened,
        "an override adds a parameter constraint or cascade marker its ancestors lack",
    ),
    (
        ConfigurationErrorKind::AmbiguousParameterConstraints,
        "unrelated ancestors declare different parameter constraints and nothing restates their union",
    ),
    (
        ConfigurationErrorKind::ParameterCascadeMismatch,
        "strict mode only: an override omits an inherited parameter cascade marker",
    ),
    (
        ConfigurationErrorKind::MalformedHierarchy,
        "no sites, a repeated declaring type, or an override of a site not declared before it",
    ),
];

fn registry_json() -> Value {
    let kinds: Vec<Value> = KINDS
        .iter()
        .map(|(kind, description)| {
            json!({
                "kind": kind,
                "label": kind.to_string(),
                "description": description,
            })
        })
        .collect();
    json!({ "schema": 1, "kinds": kinds })
}

pub fn run(json_output: bool) {
    if json_output {
        let rendered = serde_json::to_string_pretty(&registry_json()).unwrap_or_else(|err| {
            eprintln!("error: failed to render error-kinds json: {err}");
            std::process::exit(2);
        });
        println!("{rendered}");
        return;
    }

    println!("methodmeta error-kinds");
    println!("  Kinds: {}", KINDS.len());
    for (kind, description) in KINDS {
        println!("    - {kind}: {description}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_lists_every_kind_once() {
        let payload = registry_json();
        let kinds: Vec<&str> = payload["kinds"]
            .as_array()
            .unwrap()
            .iter()
            .map(|k| k["kind"].as_str().unwrap())
            .collect();
        assert_eq!(
            kinds,
            vec![
                "incompatible_signature",
                "parameter_constraint_strengthened",
                "ambiguous_parameter_constraints",
                "parameter_cascade_mismatch",
                "malformed_hierarchy",
            ]
        );
    }
}
