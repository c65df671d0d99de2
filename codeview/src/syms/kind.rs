//! Record kind tags for symbol records.
//!
//! Values are taken from `cvinfo.h`:
//! <https://github.com/microsoft/microsoft-pdb/blob/805655a28bd8198004be2ac27e6e0290121a5e89/include/cvinfo.h>

use std::fmt::{self, Debug};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

/// The kind of a symbol record. This is the `rectyp` field found at the start of every
/// CodeView symbol record.
#[repr(transparent)]
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned,
)]
pub struct SymKind(pub u16);

#[allow(missing_docs)]
impl SymKind {
    pub const S_END: Self = Self(0x0006);
    pub const S_FRAMEPROC: Self = Self(0x1012);
    pub const S_OBJNAME: Self = Self(0x1101);
    pub const S_THUNK32: Self = Self(0x1102);
    pub const S_BLOCK32: Self = Self(0x1103);
    pub const S_LABEL32: Self = Self(0x1105);
    pub const S_CONSTANT: Self = Self(0x1107);
    pub const S_UDT: Self = Self(0x1108);
    pub const S_LDATA32: Self = Self(0x110c);
    pub const S_GDATA32: Self = Self(0x110d);
    pub const S_PUB32: Self = Self(0x110e);
    pub const S_LPROC32: Self = Self(0x110f);
    pub const S_GPROC32: Self = Self(0x1110);
    pub const S_REGREL32: Self = Self(0x1111);
    pub const S_LTHREAD32: Self = Self(0x1112);
    pub const S_GTHREAD32: Self = Self(0x1113);
    pub const S_COMPILE2: Self = Self(0x1116);
    pub const S_LMANDATA: Self = Self(0x111c);
    pub const S_GMANDATA: Self = Self(0x111d);
    pub const S_UNAMESPACE: Self = Self(0x1124);
    pub const S_PROCREF: Self = Self(0x1125);
    pub const S_DATAREF: Self = Self(0x1126);
    pub const S_LPROCREF: Self = Self(0x1127);
    pub const S_ANNOTATIONREF: Self = Self(0x1128);
    pub const S_TRAMPOLINE: Self = Self(0x112c);
    pub const S_MANCONSTANT: Self = Self(0x112d);
    pub const S_ANNOTATION: Self = Self(0x1019);
    pub const S_GMANPROC: Self = Self(0x112a);
    pub const S_LMANPROC: Self = Self(0x112b);
    pub const S_SECTION: Self = Self(0x1136);
    pub const S_COFFGROUP: Self = Self(0x1137);
    pub const S_CALLSITEINFO: Self = Self(0x1139);
    pub const S_FRAMECOOKIE: Self = Self(0x113a);
    pub const S_COMPILE3: Self = Self(0x113c);
    pub const S_LOCAL: Self = Self(0x113e);
    pub const S_DEFRANGE: Self = Self(0x113f);
    pub const S_DEFRANGE_SUBFIELD: Self = Self(0x1140);
    pub const S_DEFRANGE_REGISTER: Self = Self(0x1141);
    pub const S_DEFRANGE_FRAMEPOINTER_REL: Self = Self(0x1142);
    pub const S_DEFRANGE_SUBFIELD_REGISTER: Self = Self(0x1143);
    pub const S_DEFRANGE_FRAMEPOINTER_REL_FULL_SCOPE: Self = Self(0x1144);
    pub const S_DEFRANGE_REGISTER_REL: Self = Self(0x1145);
    pub const S_LPROC32_ID: Self = Self(0x1146);
    pub const S_GPROC32_ID: Self = Self(0x1147);
    pub const S_BUILDINFO: Self = Self(0x114c);
    pub const S_INLINESITE: Self = Self(0x114d);
    pub const S_INLINESITE_END: Self = Self(0x114e);
    pub const S_PROC_ID_END: Self = Self(0x114f);
    pub const S_LPROC32_DPC: Self = Self(0x1155);
    pub const S_LPROC32_DPC_ID: Self = Self(0x1156);
    pub const S_CALLEES: Self = Self(0x115a);
    pub const S_CALLERS: Self = Self(0x115b);
    pub const S_HEAPALLOCSITE: Self = Self(0x115e);
    pub const S_ARMSWITCHTABLE: Self = Self(0x1159);
    pub const S_INLINESITE2: Self = Self(0x115d);
    pub const S_INLINEES: Self = Self(0x1168);
    pub const S_HOTPATCHFUNC: Self = Self(0x1169);
    pub const S_PUB32_ST: Self = Self(0x1009);
}

impl Debug for SymKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SymKind(0x{:04x})", self.0)
    }
}
