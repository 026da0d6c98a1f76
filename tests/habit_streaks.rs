use chrono::{TimeZone, Utc};
use menagerie_db::database::habits::{
    completed_in_current_period, habit_reward, streak_after_completion,
};
use menagerie_db::database::models::HabitCadence;

#[test]
fn daily_same_day_counts_as_completed() {
    let last = Utc.with_ymd_and_hms(2026, 8, 5, 1, 0, 0).unwrap();
    let now = Utc.with_ymd_and_hms(2026, 8, 5, 23, 0, 0).unwrap();
    assert!(completed_in_current_period(last, now, HabitCadence::Daily));
    assert!(!completed_in_current_period(
        last,
        Utc.with_ymd_and_hms(2026, 8, 6, 0, 30, 0).unwrap(),
        HabitCadence::Daily
    ));
}

#[test]
fn daily_streak_continues_from_yesterday_only() {
    let yesterday = Utc.with_ymd_and_hms(2026, 8, 4, 23, 0, 0).unwrap();
    let now = Utc.with_ymd_and_hms(2026, 8, 5, 1, 0, 0).unwrap();
    assert_eq!(
        streak_after_completion(4, Some(yesterday), now, HabitCadence::Daily),
        5
    );

    let two_days_ago = Utc.with_ymd_and_hms(2026, 8, 3, 9, 0, 0).unwrap();
    assert_eq!(
        streak_after_completion(4, Some(two_days_ago), now, HabitCadence::Daily),
        1
    );
}

#[test]
fn first_completion_starts_at_one() {
    let now = Utc.with_ymd_and_hms(2026, 8, 5, 12, 0, 0).unwrap();
    assert_eq!(streak_after_completion(0, None, now, HabitCadence::Daily), 1);
}

#[test]
fn weekly_window_uses_iso_weeks() {
    // 2026-08-03 is a Monday; the 5th sits in the same week.
    let monday = Utc.with_ymd_and_hms(2026, 8, 3, 8, 0, 0).unwrap();
    let wednesday = Utc.with_ymd_and_hms(2026, 8, 5, 8, 0, 0).unwrap();
    assert!(completed_in_current_period(
        monday,
        wednesday,
        HabitCadence::Weekly
    ));

    // Completion last week (any weekday) continues the streak this week.
    let last_week = Utc.with_ymd_and_hms(2026, 7, 29, 20, 0, 0).unwrap();
    assert_eq!(
        streak_after_completion(2, Some(last_week), wednesday, HabitCadence::Weekly),
        3
    );

    // Skipping a whole week resets.
    let two_weeks_ago = Utc.with_ymd_and_hms(2026, 7, 22, 20, 0, 0).unwrap();
    assert_eq!(
        streak_after_completion(2, Some(two_weeks_ago), wednesday, HabitCadence::Weekly),
        1
    );
}

#[test]
fn rewards_scale_with_streak_up_to_the_cap() {
    assert_eq!(habit_reward(1), 20);
    assert_eq!(habit_reward(4), 35);
    // Streaks beyond the cap pay the same as the cap.
    assert_eq!(habit_reward(30), habit_reward(300));
}
