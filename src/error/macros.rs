//! # 错误处理宏

/// 快速创建配置错误的宏
#[macro_export]
macro_rules! config_error {
    ($msg:expr) => {
        $crate::error::MarketError::config($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::MarketError::config(format!($fmt, $($arg)*))
    };
}

/// 快速创建数据库错误的宏
#[macro_export]
macro_rules! database_error {
    ($msg:expr) => {
        $crate::error::MarketError::database($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::MarketError::database(format!($fmt, $($arg)*))
    };
}

/// 快速创建认证错误的宏
#[macro_export]
macro_rules! auth_error {
    ($msg:expr) => {
        $crate::error::MarketError::auth($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::MarketError::auth(format!($fmt, $($arg)*))
    };
}

/// 快速创建权限错误的宏
#[macro_export]
macro_rules! permission_error {
    ($msg:expr) => {
        $crate::error::MarketError::permission($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::MarketError::permission(format!($fmt, $($arg)*))
    };
}

/// 快速创建验证错误的宏
#[macro_export]
macro_rules! validation_error {
    ($msg:expr) => {
        $crate::error::MarketError::validation($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::MarketError::validation(format!($fmt, $($arg)*))
    };
}

/// 快速创建业务错误的宏
#[macro_export]
macro_rules! business_error {
    ($msg:expr) => {
        $crate::error::MarketError::business($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::MarketError::business(format!($fmt, $($arg)*))
    };
}

/// 快速创建内部错误的宏
#[macro_export]
macro_rules! internal_error {
    ($msg:expr) => {
        $crate::error::MarketError::internal($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::MarketError::internal(format!($fmt, $($arg)*))
    };
}

/// 确保条件成立，否则返回验证错误
#[macro_export]
macro_rules! ensure_validation {
    ($cond:expr, $msg:expr) => {
        if !($cond) {
            return Err($crate::validation_error!($msg));
        }
    };
    ($cond:expr, $fmt:expr, $($arg:tt)*) => {
        if !($cond) {
            return Err($crate::validation_error!($fmt, $($arg)*));
        }
    };
}

/// 确保条件成立，否则返回业务错误
#[macro_export]
macro_rules! ensure_business {
    ($cond:expr, $msg:expr) => {
        if !($cond) {
            return Err($crate::business_error!($msg));
        }
    };
    ($cond:expr, $fmt:expr, $($arg:tt)*) => {
        if !($cond) {
            return Err($crate::business_error!($fmt, $($arg)*));
        }
    };
}

/// 确保条件成立，否则返回权限错误
#[macro_export]
macro_rules! ensure_permission {
    ($cond:expr, $msg:expr) => {
        if !($cond) {
            return Err($crate::permission_error!($msg));
        }
    };
}
