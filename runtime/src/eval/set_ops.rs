use uniquery_ast::{VectorMatchCardinality, VectorMatching};

use crate::eval::EvalNodeHelper;
use crate::types::{Sample, Vector};

fn assert_many_to_many(matching: &VectorMatching) {
    assert_eq!(
        matching.card,
        VectorMatchCardinality::ManyToMany,
        "set operations must only use many-to-many matching"
    );
}

/// `lhs and rhs`: left elements with a matching right element.
pub fn vector_and(
    lhs: &[Sample],
    rhs: &[Sample],
    matching: &VectorMatching,
    enh: &mut EvalNodeHelper,
) -> Vector {
    assert_many_to_many(matching);
    if lhs.is_empty() || rhs.is_empty() {
        return Vec::new();
    }

    enh.matched_sigs.clear();
    for rs in rhs {
        let sig = enh.signature(matching.on, &matching.matching_labels, &rs.metric);
        enh.matched_sigs.insert(sig);
    }
    for ls in lhs {
        let sig = enh.signature(matching.on, &matching.matching_labels, &ls.metric);
        if enh.matched_sigs.contains(&sig) {
            enh.out.push(ls.clone());
        }
    }
    enh.take_output()
}

/// `lhs or rhs`: all left elements plus right elements without a left match.
pub fn vector_or(
    lhs: &[Sample],
    rhs: &[Sample],
    matching: &VectorMatching,
    enh: &mut EvalNodeHelper,
) -> Vector {
    assert_many_to_many(matching);
    if lhs.is_empty() {
        return rhs.to_vec();
    }
    if rhs.is_empty() {
        return lhs.to_vec();
    }

    enh.matched_sigs.clear();
    for ls in lhs {
        let sig = enh.signature(matching.on, &matching.matching_labels, &ls.metric);
        enh.matched_sigs.insert(sig);
        enh.out.push(ls.clone());
    }
    for rs in rhs {
        let sig = enh.signature(matching.on, &matching.matching_labels, &rs.metric);
        if !enh.matched_sigs.contains(&sig) {
            enh.out.push(rs.clone());
        }
    }
    enh.take_output()
}

/// `lhs unless rhs`: left elements without a matching right element.
pub fn vector_unless(
    lhs: &[Sample],
    rhs: &[Sample],
    matching: &VectorMatching,
    enh: &mut EvalNodeHelper,
) -> Vector {
    assert_many_to_many(matching);
    if lhs.is_empty() || rhs.is_empty() {
        return lhs.to_vec();
    }

    enh.matched_sigs.clear();
    for rs in rhs {
        let sig = enh.signature(matching.on, &matching.matching_labels, &rs.metric);
        enh.matched_sigs.insert(sig);
    }
    for ls in lhs {
        let sig = enh.signature(matching.on, &matching.matching_labels, &ls.metric);
        if !enh.matched_sigs.contains(&sig) {
            enh.out.push(ls.clone());
        }
    }
    enh.take_output()
}
