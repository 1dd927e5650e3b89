#[macro_export]
macro_rules! impl_newtype {
    ($name:ty, $inner:ty) => {
        impl $name {
            pub fn new(v: impl Into<$inner>) -> Self {
                Self(v.into())
            }
        }
    };
}
