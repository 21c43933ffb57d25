pub mod insert;
pub mod select;

use core::str::FromStr;

use std::io::Write;

use diesel::{
    backend::Backend,
    deserialize::{self, FromSql, FromSqlRow},
    expression::AsExpression,
    pg::Pg,
    serialize::{self, IsNull, Output, ToSql},
};
use realty_domain::{
    deal::DealStatus,
    ledger::{AccountStatus, TransactionStatus, TransactionType},
    property::PropertyStatus,
};

use crate::persistence::schema::sql_types;

/// Binds a snake_case strum enum to a postgres enum type of the same labels.
macro_rules! pg_enum {
    ($name:ident($inner:ty) => $sql:ident) => {
        #[derive(Debug, Clone, Copy, AsExpression, FromSqlRow)]
        #[diesel(sql_type = sql_types::$sql)]
        pub struct $name($inner);

        impl $name {
            pub fn into_inner(self) -> $inner {
                self.0
            }
        }

        impl From<$inner> for $name {
            fn from(value: $inner) -> Self {
                Self(value)
            }
        }

        impl ToSql<sql_types::$sql, Pg> for $name {
            fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
                out.write_all(<&str>::from(&self.0).as_bytes())?;

                Ok(IsNull::No)
            }
        }

        impl FromSql<sql_types::$sql, Pg> for $name {
            fn from_sql(bz: <Pg as Backend>::RawValue<'_>) -> deserialize::Result<Self> {
                str::from_utf8(bz.as_bytes())
                    .map(FromStr::from_str)?
                    .map(Self)
                    .map_err(From::from)
            }
        }
    };
}

pg_enum!(AccountStatusRecord(AccountStatus) => AccountStatus);
pg_enum!(DealStatusRecord(DealStatus) => DealStatus);
pg_enum!(PropertyStatusRecord(PropertyStatus) => PropertyStatus);
pg_enum!(TransactionStatusRecord(TransactionStatus) => TransactionStatus);
pg_enum!(TransactionTypeRecord(TransactionType) => TransactionType);
