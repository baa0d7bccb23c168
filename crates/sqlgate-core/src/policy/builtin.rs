//! Built-in policy tables for the booking application.
//!
//! Used when no policy file is supplied. Deployments with their own schema
//! load a JSON document instead (see [`PolicyStore::from_json_file`]).

use super::capability::{FilterCapabilities, FilterClass};
use super::columns::Columns;
use super::operation::Operation;
use super::pagination::PaginationLimits;
use super::store::{PolicyStore, RolePolicy, TablePolicy};

const USER_PUBLIC_COLUMNS: &[&str] = &["id", "name", "email", "role", "department_id", "status"];
const BOOKING_COLUMNS: &[&str] = &[
    "id",
    "room_id",
    "user_id",
    "title",
    "description",
    "start_time",
    "end_time",
    "status",
    "created_at",
    "updated_at",
    "created_by",
    "updated_by",
];
const ROOM_COLUMNS: &[&str] = &["id", "name", "capacity", "floor", "is_active", "amenities"];
const VISITOR_COLUMNS: &[&str] = &[
    "id",
    "name",
    "email",
    "phone",
    "company",
    "host_id",
    "visit_date",
    "check_in_time",
    "check_out_time",
    "status",
    "created_at",
    "updated_at",
    "created_by",
    "updated_by",
];
const NOTIFICATION_COLUMNS: &[&str] = &["id", "user_id", "title", "message", "is_read", "created_at"];

fn crud() -> [Operation; 4] {
    Operation::ALL
}

fn cru() -> [Operation; 3] {
    [Operation::Create, Operation::Read, Operation::Update]
}

impl PolicyStore {
    /// The built-in policy set.
    pub fn builtin() -> Self {
        let admin = RolePolicy::new(
            FilterCapabilities::all(),
            PaginationLimits::new(1_000, 50, 1_000_000),
        )
        .with_table("users", TablePolicy::full())
        .with_table("bookings", TablePolicy::full())
        .with_table("rooms", TablePolicy::full())
        .with_table("visitors", TablePolicy::full())
        .with_table("notifications", TablePolicy::full())
        .with_table("departments", TablePolicy::full())
        .with_table("audit_logs", TablePolicy::read_only(Columns::All))
        .with_table("settings", TablePolicy::full());

        let manager = RolePolicy::new(
            FilterCapabilities::all(),
            PaginationLimits::new(500, 25, 100_000),
        )
        .with_table("users", TablePolicy::new(Columns::named(USER_PUBLIC_COLUMNS), [Operation::Read, Operation::Update]))
        .with_table("bookings", TablePolicy::new(Columns::All, crud()))
        .with_table("rooms", TablePolicy::new(Columns::All, cru()))
        .with_table("visitors", TablePolicy::new(Columns::All, crud()))
        .with_table("notifications", TablePolicy::new(Columns::named(NOTIFICATION_COLUMNS), cru()))
        .with_table("departments", TablePolicy::read_only(Columns::All))
        .with_table("audit_logs", TablePolicy::denied());

        let staff = RolePolicy::new(
            FilterCapabilities::all().with(FilterClass::CustomQueries, false),
            PaginationLimits::new(200, 20, 20_000),
        )
        .with_table("users", TablePolicy::read_only(Columns::named(["id", "name", "email", "department_id"])))
        .with_table("bookings", TablePolicy::new(Columns::named(BOOKING_COLUMNS), cru()))
        .with_table("rooms", TablePolicy::read_only(Columns::named(ROOM_COLUMNS)))
        .with_table("visitors", TablePolicy::new(Columns::named(VISITOR_COLUMNS), cru()))
        .with_table("notifications", TablePolicy::new(Columns::named(NOTIFICATION_COLUMNS), [Operation::Read, Operation::Update]));

        let reception = RolePolicy::new(
            FilterCapabilities::all()
                .with(FilterClass::NumericRange, false)
                .with(FilterClass::CustomQueries, false),
            PaginationLimits::new(100, 20, 10_000),
        )
        .with_table("visitors", TablePolicy::new(Columns::named(VISITOR_COLUMNS), cru()))
        .with_table("rooms", TablePolicy::read_only(Columns::named(ROOM_COLUMNS)))
        .with_table("bookings", TablePolicy::read_only(Columns::named(["id", "room_id", "title", "start_time", "end_time", "status"])))
        .with_table("users", TablePolicy::read_only(Columns::named(["id", "name", "department_id"])));

        let employee = RolePolicy::new(
            FilterCapabilities::all()
                .with(FilterClass::ArrayFilter, false)
                .with(FilterClass::CustomQueries, false),
            PaginationLimits::new(100, 20, 5_000),
        )
        .with_table("bookings", TablePolicy::new(Columns::named(BOOKING_COLUMNS), cru()))
        .with_table("rooms", TablePolicy::read_only(Columns::named(ROOM_COLUMNS)))
        .with_table("notifications", TablePolicy::new(Columns::named(NOTIFICATION_COLUMNS), [Operation::Read, Operation::Update]));

        let assistant = RolePolicy::new(
            FilterCapabilities::all().with(FilterClass::CustomQueries, false),
            PaginationLimits::new(100, 20, 5_000),
        )
        .with_table("bookings", TablePolicy::new(Columns::named(BOOKING_COLUMNS), cru()))
        .with_table("visitors", TablePolicy::new(Columns::named(VISITOR_COLUMNS), cru()))
        .with_table("rooms", TablePolicy::read_only(Columns::named(ROOM_COLUMNS)));

        let user = RolePolicy::new(
            FilterCapabilities {
                text_search: true,
                date_range: true,
                boolean_filter: true,
                null_check: true,
                ..FilterCapabilities::none()
            },
            PaginationLimits::new(50, 10, 1_000),
        )
        .with_table("bookings", TablePolicy::new(Columns::named(BOOKING_COLUMNS), [Operation::Create, Operation::Read]))
        .with_table("rooms", TablePolicy::read_only(Columns::named(["id", "name", "capacity", "floor"])))
        .with_table("notifications", TablePolicy::new(Columns::named(NOTIFICATION_COLUMNS), [Operation::Read, Operation::Update]));

        let visitor = RolePolicy::new(
            FilterCapabilities {
                text_search: true,
                boolean_filter: true,
                null_check: true,
                ..FilterCapabilities::none()
            },
            PaginationLimits::new(20, 10, 200),
        )
        .with_table("rooms", TablePolicy::read_only(Columns::named(["id", "name", "capacity", "floor"])));

        PolicyStore::new()
            .with_role("admin", admin)
            .with_role("manager", manager)
            .with_role("staff", staff)
            .with_role("reception", reception)
            .with_role("employee", employee)
            .with_role("assistant", assistant)
            .with_role("user", user)
            .with_role("visitor", visitor)
            .with_level("admin", 100)
            .with_level("manager", 80)
            .with_level("staff", 60)
            .with_level("reception", 50)
            .with_level("assistant", 45)
            .with_level("employee", 40)
            .with_level("user", 20)
            .with_level("visitor", 10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_round_trips_through_validation() {
        let doc = PolicyStore::builtin().to_document();
        let reloaded = PolicyStore::from_document(doc).unwrap();
        assert_eq!(reloaded.roles().len(), 8);
    }

    #[test]
    fn test_visitor_cannot_range_filter() {
        let s = PolicyStore::builtin();
        assert!(!s.can_use_filter_class("visitor", FilterClass::NumericRange));
        assert!(s.can_use_filter_class("visitor", FilterClass::TextSearch));
        assert!(!s.can_access_table("visitor", "users"));
    }

    #[test]
    fn test_admin_has_wildcard_on_users() {
        let s = PolicyStore::builtin();
        assert!(s.allowed_columns("admin", "users").is_all());
        assert!(!s.can_perform_operation("admin", "audit_logs", Operation::Delete));
    }

    #[test]
    fn test_employee_limits() {
        assert_eq!(PolicyStore::builtin().pagination_limits("employee").max_limit, 100);
    }
}
