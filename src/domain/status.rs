use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;

/// Declares a string-backed enum that is stored as `TEXT` and exchanged as snake_case JSON.
macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $value:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $value),+
                }
            }
        }

        impl FromStr for $name {
            type Err = AppError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $($value => Ok($name::$variant),)+
                    other => Err(AppError::BadRequest(format!(
                        "Invalid {} '{}'",
                        stringify!($name),
                        other
                    ))),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

string_enum!(
    /// Lifecycle of an order as a whole.
    OrderStatus {
        Pending => "pending",
        Confirmed => "confirmed",
        Preparing => "preparing",
        Ready => "ready",
        Completed => "completed",
        Cancelled => "cancelled",
    }
);

string_enum!(
    /// Kitchen state of a single line item.
    ItemStatus {
        Pending => "pending",
        Preparing => "preparing",
        Ready => "ready",
        Served => "served",
    }
);

string_enum!(
    PaymentStatus {
        Unpaid => "unpaid",
        Paid => "paid",
    }
);

string_enum!(
    PaymentMethod {
        Cash => "cash",
        Card => "card",
        Transfer => "transfer",
        Ewallet => "ewallet",
    }
);

string_enum!(
    TableStatus {
        Available => "available",
        Serving => "serving",
        Completed => "completed",
    }
);

string_enum!(
    OrderType {
        DineIn => "dine_in",
        Takeaway => "takeaway",
    }
);

string_enum!(
    OrderSource {
        Online => "online",
        Pos => "pos",
    }
);

string_enum!(
    Role {
        Customer => "customer",
        Staff => "staff",
        Admin => "admin",
    }
);

impl OrderStatus {
    fn rank(&self) -> u8 {
        match self {
            OrderStatus::Pending => 0,
            OrderStatus::Confirmed => 1,
            OrderStatus::Preparing => 2,
            OrderStatus::Ready => 3,
            OrderStatus::Completed => 4,
            OrderStatus::Cancelled => 4,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// Orders only move forward. Skipping steps is allowed, going back is not,
    /// and nothing leaves `completed` or `cancelled`.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            OrderStatus::Cancelled => true,
            _ => next.rank() > self.rank(),
        }
    }

    pub fn ensure_transition(&self, next: OrderStatus) -> Result<(), AppError> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(AppError::Conflict(format!(
                "Order cannot move from {} to {}",
                self, next
            )))
        }
    }
}

impl ItemStatus {
    fn rank(&self) -> u8 {
        match self {
            ItemStatus::Pending => 0,
            ItemStatus::Preparing => 1,
            ItemStatus::Ready => 2,
            ItemStatus::Served => 3,
        }
    }

    pub fn can_transition_to(&self, next: ItemStatus) -> bool {
        next.rank() > self.rank()
    }

    pub fn is_done(&self) -> bool {
        matches!(self, ItemStatus::Ready | ItemStatus::Served)
    }
}

/// Order status implied by the kitchen state of its items.
///
/// Returns `None` when the order should keep its current status.
pub fn derive_order_status(current: OrderStatus, items: &[ItemStatus]) -> Option<OrderStatus> {
    if items.is_empty() {
        return None;
    }
    let all_done = items.iter().all(ItemStatus::is_done);
    let any_preparing = items.contains(&ItemStatus::Preparing);

    // A pending order still waits for staff confirmation before it can be ready.
    let target = match current {
        OrderStatus::Confirmed | OrderStatus::Preparing if all_done => OrderStatus::Ready,
        OrderStatus::Pending | OrderStatus::Confirmed if any_preparing => OrderStatus::Preparing,
        _ => return None,
    };
    (target != current).then_some(target)
}

impl Role {
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Staff | Role::Admin)
    }
}
