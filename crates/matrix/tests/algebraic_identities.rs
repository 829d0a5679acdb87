//! Property tests for the algebraic identities spec.md §8 requires of the
//! matrix engine: double transpose, associativity, distributivity, and the
//! diagonal row/column-scale invariant.

use matrix::{any_pair, build, method, Descriptor, Matrix, Sauna};
use proptest::prelude::*;

const N: usize = 5;

fn arb_bool_matrix(n: usize) -> impl Strategy<Value = Matrix<bool>> {
    prop::collection::vec(prop::bool::ANY, n * n).prop_map(move |bits| {
        let mut i = Vec::new();
        let mut j = Vec::new();
        for row in 0..n {
            for col in 0..n {
                if bits[row * n + col] {
                    i.push(row);
                    j.push(col);
                }
            }
        }
        let x = vec![true; i.len()];
        build(n, n, &i, &j, &x, |a, b| *a || *b)
    })
}

fn mul(a: &Matrix<bool>, b: &Matrix<bool>) -> Matrix<bool> {
    let mut sauna = Sauna::new(a.vlen().max(a.vdim()).max(b.vdim()));
    method::mxm(a, b, &any_pair(), None, &Descriptor::none(), &mut sauna).unwrap()
}

fn sorted_tuples(m: &Matrix<bool>) -> Vec<(usize, usize)> {
    let (is, js, _) = m.extract_tuples();
    let mut pairs: Vec<(usize, usize)> = is.into_iter().zip(js).collect();
    pairs.sort_unstable();
    pairs
}

proptest! {
    #[test]
    fn transpose_is_involutive(a in arb_bool_matrix(N)) {
        let tt = method::transpose(&method::transpose(&a));
        prop_assert_eq!(sorted_tuples(&a), sorted_tuples(&tt));
    }

    #[test]
    fn matrix_multiply_is_associative(a in arb_bool_matrix(N), b in arb_bool_matrix(N), c in arb_bool_matrix(N)) {
        let ab_c = mul(&mul(&a, &b), &c);
        let a_bc = mul(&a, &mul(&b, &c));
        prop_assert_eq!(sorted_tuples(&ab_c), sorted_tuples(&a_bc));
    }

    #[test]
    fn multiply_distributes_over_add(a in arb_bool_matrix(N), b in arb_bool_matrix(N), c in arb_bool_matrix(N)) {
        let bc = method::ewise_add(&b, &c, |x, y| *x || *y).unwrap();
        let a_bc = mul(&a, &bc);
        let ab = mul(&a, &b);
        let ac = mul(&a, &c);
        let ab_plus_ac = method::ewise_add(&ab, &ac, |x, y| *x || *y).unwrap();
        prop_assert_eq!(sorted_tuples(&a_bc), sorted_tuples(&ab_plus_ac));
    }

    #[test]
    fn diagonal_left_operand_scales_rows_without_changing_pattern(
        a in arb_bool_matrix(N),
        diag_present in prop::collection::vec(any::<bool>(), N),
    ) {
        let idx: Vec<usize> = (0..N).filter(|&k| diag_present[k]).collect();
        let d = build(N, N, &idx, &idx, &vec![true; idx.len()], |x, y| *x || *y);
        let da = mul(&d, &a);
        // Every surviving row of D*A must have been present in A at a row
        // selected by D; D*A's pattern is therefore a subset of A's.
        let a_pattern = sorted_tuples(&a);
        for (i, j) in sorted_tuples(&da) {
            prop_assert!(diag_present[i]);
            prop_assert!(a_pattern.contains(&(i, j)));
        }
    }
}
