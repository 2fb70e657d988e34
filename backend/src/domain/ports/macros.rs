//! Helper macro generating port error enums with snake-case constructors.

macro_rules! define_port_error {
    (@ctor $variant:ident) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@ctor $variant:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        define_port_error!(@ctor_impl $variant () () $( $field : $ty, )*);
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) ) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]($($params)*) -> Self {
                Self::$variant { $($inits)* }
            }
        }
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) $field:ident : $ty:ty, $($rest:tt)*) => {
        define_port_error!(
            @ctor_impl
            $variant
            ($($params)* $field: impl Into<$ty>,)
            ($($inits)* $field: $field.into(),)
            $($rest)*
        );
    };
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )? => $message:expr
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $($field : $ty),* } )?,
            )*
        }

        impl $name {
            $(
                define_port_error!(@ctor $variant $( { $($field : $ty),* } )?);
            )*
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    //! Constructor generation for port errors.
    define_port_error! {
        pub enum LedgerPortError {
            Unavailable { message: String } => "ledger unavailable: {message}",
            Conflict { provider_id: String, attempts: u32 } => "conflict on {provider_id} after {attempts} attempts",
            Closed => "ledger closed",
        }
    }

    #[test]
    fn string_fields_accept_str() {
        let err = LedgerPortError::unavailable("pool exhausted");
        assert_eq!(err.to_string(), "ledger unavailable: pool exhausted");
    }

    #[test]
    fn mixed_fields_keep_their_types() {
        let err = LedgerPortError::conflict("100001", 2_u32);
        assert_eq!(err.to_string(), "conflict on 100001 after 2 attempts");
    }

    #[test]
    fn unit_variants_get_constructors() {
        assert_eq!(LedgerPortError::closed(), LedgerPortError::Closed);
    }
}
