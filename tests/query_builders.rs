use menagerie_db::constants::MAX_PAGE_SIZE;
use menagerie_db::util::{in_placeholders, limit_offset, random_limit};

#[test]
fn limit_offset_clamps_both_bounds() {
    assert_eq!(limit_offset(10, 20), " LIMIT 10 OFFSET 20");
    assert_eq!(
        limit_offset(MAX_PAGE_SIZE + 100, -5),
        format!(" LIMIT {} OFFSET 0", MAX_PAGE_SIZE)
    );
    assert_eq!(limit_offset(0, 0), " LIMIT 1 OFFSET 0");
}

#[test]
fn random_limit_clamps_like_pagination() {
    assert_eq!(random_limit(1), " ORDER BY RANDOM() LIMIT 1");
    assert_eq!(
        random_limit(-3),
        " ORDER BY RANDOM() LIMIT 1"
    );
}

#[test]
fn in_placeholders_numbers_from_the_given_start() {
    assert_eq!(in_placeholders(1, 3), "$1, $2, $3");
    assert_eq!(in_placeholders(4, 2), "$4, $5");
    assert_eq!(in_placeholders(1, 0), "");
}
