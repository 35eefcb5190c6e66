//! Shared regression vectors for the statistics tests.
//!
//! The 50-sample value set and its irregular timestamp offsets drive both
//! the moments and the rate suites; the expected statistics are the
//! long-standing baselines for this data.

pub const TEST_SAMPLE_SET: [i64; 50] = [
    9675058, -1689853, -3725820, -705873, -3251762, -4231217, 1198474, -1222771, 6042688, 1417426,
    9394784, -3796327, 1215914, 4205163, -8477723, 3520070, 745446, 8757462, -7131680, -6519221,
    -8401375, -1795469, -5918478, -6614860, -2001987, -9988298, -626305, -7724919, 9694132,
    5006064, 7279687, -1673061, -9803177, 6115289, 647511, 3251507, -4252489, -1598969, 4168172,
    9554726, -4176556, 8863435, 1681047, -169245, 912269, -9210523, 4355342, 8089016, 7113846,
    7384336,
];

/// Nanosecond offsets pairing with `TEST_SAMPLE_SET`, in driving order.
pub const TEST_TIME_OFFSETS: [u64; 50] = [
    3415, 4722, 5704, 9097, 15862, 16712, 16967, 18683, 19004, 19653, 20430, 20438, 22254, 22556,
    23400, 24402, 24752, 26056, 29225, 31666, 32095, 39859, 46793, 48826, 48900, 57867, 58500,
    59443, 59580, 61345, 63637, 65565, 68570, 68612, 69711, 72196, 72247, 73067, 75216, 75252,
    76043, 79518, 79686, 80669, 85560, 87537, 88372, 93209, 97658, 98853,
];

/// Assert two floats agree to a relative tolerance.
pub fn assert_rel_eq(name: &str, got: f64, want: f64, tolerance: f64) {
    if want == 0.0 {
        assert_eq!(got, 0.0, "{} is {}, should be 0", name, got);
        return;
    }
    let diff = (got / want - 1.0).abs();
    assert!(
        diff < tolerance,
        "{} is {:e}, should be {:e} (relative error {:e})",
        name,
        got,
        want,
        diff
    );
}
