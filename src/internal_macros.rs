macro_rules! impl_consensus_encoding {
    ($thing:ident, $($field:ident),+) => (
        impl $crate::consensus::Encodable for $thing {
            fn consensus_encode<W: std::io::Write + ?Sized>(
                &self,
                writer: &mut W,
            ) -> Result<usize, std::io::Error> {
                let mut len = 0;
                $(len += self.$field.consensus_encode(writer)?;)+
                Ok(len)
            }
        }

        impl $crate::consensus::Decodable for $thing {
            fn consensus_decode<R: std::io::Read + ?Sized>(
                reader: &mut R,
            ) -> Result<$thing, $crate::consensus::encode::Error> {
                Ok($thing {
                    $($field: $crate::consensus::Decodable::consensus_decode(reader)?),+
                })
            }
        }
    );
}

pub(crate) use impl_consensus_encoding;
