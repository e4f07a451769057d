//! Properties that hold for every model, checked over generated ones.

use lpframe_lp::{Parser, read_lp, to_lp_string, verify};
use lpframe_model::{Bounds, LinearExpr, Model, Name, Relation, VarKind, VariableId};
use proptest::collection::vec;
use proptest::prelude::*;

#[derive(Debug, Clone)]
struct Shape {
    /// (kind, bounds) choice per variable
    vars: Vec<(u8, u8)>,
    maximize: bool,
    objective: Vec<f64>,
    objective_constant: f64,
    /// (added, subtracted, relation, rhs) per row
    rows: Vec<(Vec<f64>, Vec<f64>, u8, f64)>,
}

fn coeff() -> impl Strategy<Value = f64> {
    prop::sample::select(vec![-3.5, -1.0, -0.25, 0.0, 0.5, 1.0, 2.0, 7.0, 1e-7])
}

fn shape() -> impl Strategy<Value = Shape> {
    (
        vec((0..3u8, 0..6u8), 1..7),
        any::<bool>(),
        vec(coeff(), 0..7),
        coeff(),
        vec((vec(coeff(), 0..7), vec(coeff(), 0..7), 0..3u8, -20i32..20), 0..5),
    )
        .prop_map(|(vars, maximize, objective, objective_constant, rows)| Shape {
            vars,
            maximize,
            objective,
            objective_constant,
            rows: rows
                .into_iter()
                .map(|(added, subtracted, relation, rhs)| (added, subtracted, relation, f64::from(rhs) / 2.0))
                .collect(),
        })
}

fn kind(choice: u8) -> VarKind {
    match choice {
        0 => VarKind::Continuous,
        1 => VarKind::Integer,
        _ => VarKind::Binary,
    }
}

fn bounds(choice: u8) -> Bounds {
    match choice {
        0 => Bounds::default(),
        1 => Bounds::new(0.0, 4.0),
        2 => Bounds::new(-2.0, f64::INFINITY),
        3 => Bounds::free(),
        4 => Bounds::fixed(3.0),
        _ => Bounds::new(f64::NEG_INFINITY, 6.0),
    }
}

fn relation(choice: u8) -> Relation {
    match choice {
        0 => Relation::Le,
        1 => Relation::Ge,
        _ => Relation::Eq,
    }
}

fn expr(ids: &[VariableId], coefficients: &[f64]) -> LinearExpr {
    LinearExpr::from_terms(ids.iter().copied().zip(coefficients.iter().copied())).unwrap()
}

fn build(shape: &Shape) -> Model {
    let mut model = Model::new();
    let ids: Vec<VariableId> = shape
        .vars
        .iter()
        .enumerate()
        .map(|(i, (k, b))| {
            model
                .declare_variable(Name::indexed("v", [i.to_string()]), bounds(*b), kind(*k))
                .unwrap()
        })
        .collect();

    let objective = expr(&ids, &shape.objective).add(&LinearExpr::constant(shape.objective_constant));
    if shape.maximize {
        model.maximize(objective).unwrap();
    } else {
        model.minimize(objective).unwrap();
    }

    for (i, (added, subtracted, rel, rhs)) in shape.rows.iter().enumerate() {
        let lhs = expr(&ids, added)
            .sub(&expr(&ids, subtracted))
            .add(&LinearExpr::constant(0.5));
        if lhs.is_empty() {
            continue;
        }
        model
            .add_constraint(format!("r{i}"), lhs, relation(*rel), *rhs)
            .unwrap();
    }
    model
}

/// Each row as its name and `(variable, coefficient)` list.
fn row_terms(model: &Model) -> Vec<(String, Vec<(String, f64)>)> {
    model
        .constraints()
        .iter()
        .map(|row| {
            let terms = row
                .expr
                .terms()
                .iter()
                .map(|(id, c)| (model.variable(*id).unwrap().name.to_string(), *c))
                .collect();
            (row.name.to_string(), terms)
        })
        .collect()
}

proptest! {
    #[test]
    fn prop_repeated_writes_are_identical(shape in shape()) {
        let model = build(&shape);
        let first = to_lp_string(&model).unwrap();
        let second = to_lp_string(&model).unwrap();
        prop_assert_eq!(&first, &second);
        prop_assert!(verify(&first).is_match());
    }

    #[test]
    fn prop_signature_tracks_body(left in shape(), right in shape()) {
        let left = to_lp_string(&build(&left)).unwrap();
        let right = to_lp_string(&build(&right)).unwrap();
        let split = |text: &str| {
            let mut lines = text.splitn(3, '\n');
            let _banner = lines.next();
            (lines.next().unwrap().to_string(), lines.next().unwrap().to_string())
        };
        let (left_sig, left_body) = split(&left);
        let (right_sig, right_body) = split(&right);
        prop_assert_eq!(left_sig == right_sig, left_body == right_body);
    }

    #[test]
    fn prop_add_and_sub_drop_cancelled_terms(
        left in vec(coeff(), 0..7),
        right in vec(coeff(), 0..7),
    ) {
        let ids: Vec<VariableId> = (0..7).map(VariableId::new).collect();
        let (a, b) = (expr(&ids, &left), expr(&ids, &right));

        for combined in [a.add(&b), a.sub(&b), b.sub(&a), a.add(&b).sub(&b)] {
            prop_assert!(combined.terms().iter().all(|(_, c)| *c != 0.0));
        }
        prop_assert!(a.sub(&a).is_empty());
    }

    #[test]
    fn prop_written_terms_are_nonzero(shape in shape()) {
        let text = to_lp_string(&build(&shape)).unwrap();
        let document = Parser::parse(&text).unwrap();
        let rows = document.rows.iter().map(|row| &row.expr);
        for parsed in std::iter::once(&document.objective.expr).chain(rows) {
            prop_assert!(parsed.terms.iter().all(|term| term.coeff != 0.0));
        }
    }

    #[test]
    fn prop_read_back_keeps_rows_and_text(shape in shape()) {
        let model = build(&shape);
        let first = to_lp_string(&model).unwrap();
        let reread = read_lp(&first).unwrap();
        prop_assert_eq!(row_terms(&reread), row_terms(&model));
        prop_assert_eq!(to_lp_string(&reread).unwrap(), first);
    }
}
