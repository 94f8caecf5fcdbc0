//! `define_port_error!` declares the error enum of a driven port.
//!
//! Each variant carries a `thiserror` message and gets a snake_case
//! constructor whose fields accept anything convertible into the stored
//! type, so adapters can write `ItineraryRepositoryError::query(err.to_string())`
//! or `JobDispatchError::rejected("queue full")`.

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
    use rstest::rstest;

    define_port_error! {
        pub enum SeatRepositoryError {
            Connection { message: String } => "seat repository connection failed: {message}",
            Overbooked { requested: u8, free: u8 } => "requested {requested} seats, {free} free",
            Closed => "itinerary no longer takes bookings",
        }
    }

    #[rstest]
    fn string_fields_take_borrowed_text() {
        let err = SeatRepositoryError::connection("pool timed out");
        assert_eq!(err.to_string(), "seat repository connection failed: pool timed out");
    }

    #[rstest]
    fn numeric_fields_keep_their_type() {
        let err = SeatRepositoryError::overbooked(4_u8, 2_u8);
        assert_eq!(
            err,
            SeatRepositoryError::Overbooked {
                requested: 4,
                free: 2
            }
        );
        assert_eq!(err.to_string(), "requested 4 seats, 2 free");
    }

    #[rstest]
    fn unit_variants_get_constructors() {
        assert_eq!(SeatRepositoryError::closed(), SeatRepositoryError::Closed);
    }
}
