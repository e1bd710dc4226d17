//! Convenience macros for working with KNX addresses.

/// Creates a [`GroupAddress`](crate::address::GroupAddress) from 3-level
/// notation, validated at compile time.
///
/// # Examples
///
/// ```
/// use knx_monitor::ga;
///
/// let kitchen = ga!(1/2/3);
/// assert_eq!(kitchen.to_string(), "1/2/3");
/// ```
///
/// Out-of-range components fail to compile:
///
/// ```compile_fail
/// use knx_monitor::ga;
/// let addr = ga!(32/0/0);
/// ```
#[macro_export]
macro_rules! ga {
    ($main:literal / $middle:literal / $sub:literal) => {{
        const _: () = {
            if $main > 31 {
                panic!("main group must be 0-31");
            }
            if $middle > 7 {
                panic!("middle group must be 0-7");
            }
            if $sub > 255 {
                panic!("sub group must be 0-255");
            }
        };
        $crate::address::GroupAddress::from(
            (($main as u16) << 11) | (($middle as u16) << 8) | ($sub as u16),
        )
    }};
}
