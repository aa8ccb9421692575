/// The symbol every price is shown with.
pub const RUPEE: char = '₹';

/// Formats a whole-rupee amount with Indian digit grouping: the last
/// three digits form one group and every group before that has two.
///
/// ```
/// use giftwise::currency::format_price;
/// assert_eq!(format_price(849), "₹849");
/// assert_eq!(format_price(10_000), "₹10,000");
/// assert_eq!(format_price(1_234_567), "₹12,34,567");
/// ```
pub fn format_price(rupees: u32) -> String {
    let digits = rupees.to_string();
    let split = digits.len().saturating_sub(3);
    let (head, tail) = digits.split_at(split);

    let mut groups = Vec::new();
    let mut rest = head;

    while rest.len() > 2 {
        let (front, back) = rest.split_at(rest.len() - 2);
        groups.push(back);
        rest = front;
    }

    if !rest.is_empty() {
        groups.push(rest);
    }

    groups.reverse();
    groups.push(tail);

    format!("{}{}", RUPEE, groups.join(","))
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::format_price;

    #[test]
    fn groups_like_the_indian_numbering_system() {
        assert_eq!(format_price(0), "₹0");
        assert_eq!(format_price(500), "₹500");
        assert_eq!(format_price(1_000), "₹1,000");
        assert_eq!(format_price(8_999), "₹8,999");
        assert_eq!(format_price(99_999), "₹99,999");
        assert_eq!(format_price(1_00_000), "₹1,00,000");
        assert_eq!(format_price(4_294_967_295), "₹4,29,49,67,295");
    }

    proptest! {
        #[test]
        fn formatting_keeps_every_digit(rupees in any::<u32>()) {
            let formatted = format_price(rupees);
            let digits: String = formatted.chars().filter(char::is_ascii_digit).collect();

            prop_assert_eq!(digits, rupees.to_string());
        }
    }
}
