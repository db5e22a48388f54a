use uid::Id as IdT;

#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct InstanceTag(());

pub type Id = IdT<InstanceTag>;

pub fn new_uid() -> Id {
    Id::new()
}
